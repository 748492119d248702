use crate::types::{ManifestVariant, PlatformKind, ResourceCeiling, TargetDescriptor};
use once_cell::sync::Lazy;

/// The four hosting platforms the deployment guides document, in the
/// order the guides present them. Selected, never computed.
static REGISTRY: Lazy<Vec<TargetDescriptor>> = Lazy::new(|| {
    vec![
        TargetDescriptor {
            kind: PlatformKind::StreamlitCloud,
            display_name: "Streamlit Cloud".to_string(),
            entry_file: "streamlit_app.py".to_string(),
            // The platform installs requirements-streamlit.txt and
            // packages.txt on its own.
            build_command: None,
            start_command: "streamlit run streamlit_app.py".to_string(),
            ceiling: ResourceCeiling::mib(1024),
            manifest: ManifestVariant::Lightweight,
            required_secrets: vec!["API_URL".to_string()],
            dashboard_url: "https://share.streamlit.io".to_string(),
        },
        TargetDescriptor {
            kind: PlatformKind::Render,
            display_name: "Render".to_string(),
            entry_file: "api/main.py".to_string(),
            build_command: Some("pip install -r requirements-streamlit.txt".to_string()),
            start_command: "uvicorn api.main:app --host 0.0.0.0 --port $PORT".to_string(),
            ceiling: ResourceCeiling::mib(512),
            manifest: ManifestVariant::Lightweight,
            required_secrets: vec!["OPENAI_API_KEY".to_string()],
            dashboard_url: "https://dashboard.render.com".to_string(),
        },
        TargetDescriptor {
            kind: PlatformKind::Replit,
            display_name: "Replit".to_string(),
            entry_file: "run.py".to_string(),
            build_command: None,
            start_command: "python run.py --no-browser".to_string(),
            ceiling: ResourceCeiling::mib(1024),
            manifest: ManifestVariant::Lightweight,
            required_secrets: vec!["OPENAI_API_KEY".to_string()],
            dashboard_url: "https://replit.com".to_string(),
        },
        TargetDescriptor {
            kind: PlatformKind::HuggingFaceSpaces,
            display_name: "Hugging Face Spaces".to_string(),
            entry_file: "streamlit_app.py".to_string(),
            // The Streamlit SDK builds from requirements.txt at the root.
            build_command: None,
            start_command: "streamlit run streamlit_app.py".to_string(),
            ceiling: ResourceCeiling::mib(16384),
            manifest: ManifestVariant::Full,
            required_secrets: vec!["API_URL".to_string()],
            dashboard_url: "https://huggingface.co/spaces".to_string(),
        },
    ]
});

pub fn registry() -> &'static [TargetDescriptor] {
    &REGISTRY
}

/// Look up the descriptor for a platform. Every [`PlatformKind`] has one.
pub fn descriptor(kind: PlatformKind) -> &'static TargetDescriptor {
    REGISTRY
        .iter()
        .find(|t| t.kind == kind)
        .expect("registry covers every platform kind")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_exactly_four_targets() {
        assert_eq!(registry().len(), 4);
    }

    #[test]
    fn every_kind_has_a_descriptor() {
        for kind in PlatformKind::ALL {
            let descriptor = descriptor(kind);
            assert_eq!(descriptor.kind, kind);
            assert!(!descriptor.start_command.is_empty());
            assert!(descriptor.ceiling.memory_mib > 0);
        }
    }

    #[test]
    fn free_tiers_use_the_lightweight_manifest() {
        for kind in [
            PlatformKind::StreamlitCloud,
            PlatformKind::Render,
            PlatformKind::Replit,
        ] {
            assert_eq!(descriptor(kind).manifest, ManifestVariant::Lightweight);
        }
        assert_eq!(
            descriptor(PlatformKind::HuggingFaceSpaces).manifest,
            ManifestVariant::Full
        );
    }

    #[test]
    fn render_serves_the_api_backend() {
        let render = descriptor(PlatformKind::Render);
        assert!(render.start_command.starts_with("uvicorn api.main:app"));
        assert_eq!(render.ceiling.memory_mib, 512);
    }

    #[test]
    fn streamlit_targets_run_the_cloud_entry() {
        for kind in [PlatformKind::StreamlitCloud, PlatformKind::HuggingFaceSpaces] {
            assert_eq!(descriptor(kind).entry_file, "streamlit_app.py");
        }
    }
}
