use serde::{Deserialize, Serialize};
use std::fmt;

/// Hosting platforms the deployment guides cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformKind {
    /// Streamlit Community Cloud (web frontend only)
    StreamlitCloud,
    /// Render web service (API backend)
    Render,
    /// Replit workspace running the full launcher
    Replit,
    /// Hugging Face Space with the Streamlit SDK
    HuggingFaceSpaces,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 4] = [
        PlatformKind::StreamlitCloud,
        PlatformKind::Render,
        PlatformKind::Replit,
        PlatformKind::HuggingFaceSpaces,
    ];
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            PlatformKind::StreamlitCloud => "streamlit-cloud",
            PlatformKind::Render => "render",
            PlatformKind::Replit => "replit",
            PlatformKind::HuggingFaceSpaces => "hugging-face-spaces",
        };
        write!(f, "{id}")
    }
}

/// Which requirements file a platform installs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestVariant {
    /// Full stack including local model inference
    Full,
    /// API-based stack that fits free-tier memory
    Lightweight,
}

impl ManifestVariant {
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestVariant::Full => "requirements.txt",
            ManifestVariant::Lightweight => "requirements-streamlit.txt",
        }
    }
}

impl fmt::Display for ManifestVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestVariant::Full => write!(f, "full"),
            ManifestVariant::Lightweight => write!(f, "lightweight"),
        }
    }
}

/// Memory available to the application on a given tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCeiling {
    pub memory_mib: u64,
}

impl ResourceCeiling {
    pub const fn mib(memory_mib: u64) -> Self {
        Self { memory_mib }
    }
}

impl fmt::Display for ResourceCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.memory_mib >= 1024 && self.memory_mib % 1024 == 0 {
            write!(f, "{} GiB", self.memory_mib / 1024)
        } else {
            write!(f, "{} MiB", self.memory_mib)
        }
    }
}

/// Everything the guides document about one hosting platform.
///
/// Descriptors are selected from a fixed registry, never computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub kind: PlatformKind,
    pub display_name: String,
    /// File the platform executes or serves from the repository root.
    pub entry_file: String,
    /// Build step, when the operator configures one. `None` means the
    /// platform installs dependencies on its own.
    pub build_command: Option<String>,
    pub start_command: String,
    pub ceiling: ResourceCeiling,
    pub manifest: ManifestVariant,
    /// Secret keys the platform dashboard must hold before first request.
    pub required_secrets: Vec<String>,
    pub dashboard_url: String,
}

impl TargetDescriptor {
    pub fn manifest_file(&self) -> &'static str {
        self.manifest.file_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_ids_are_stable() {
        assert_eq!(PlatformKind::StreamlitCloud.to_string(), "streamlit-cloud");
        assert_eq!(
            PlatformKind::HuggingFaceSpaces.to_string(),
            "hugging-face-spaces"
        );
    }

    #[test]
    fn variant_file_names_match_repo_layout() {
        assert_eq!(ManifestVariant::Full.file_name(), "requirements.txt");
        assert_eq!(
            ManifestVariant::Lightweight.file_name(),
            "requirements-streamlit.txt"
        );
    }

    #[test]
    fn ceiling_formats_round_gib() {
        assert_eq!(ResourceCeiling::mib(512).to_string(), "512 MiB");
        assert_eq!(ResourceCeiling::mib(16384).to_string(), "16 GiB");
    }
}
