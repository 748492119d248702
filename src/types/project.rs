use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Canonical layout of an AETHER project tree.
///
/// The deployment guides reference these paths by name; the tooling
/// verifies them rather than discovering them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLayout {
    pub root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local launcher script (`run.py`).
    pub fn launcher(&self) -> PathBuf {
        self.root.join("run.py")
    }

    /// FastAPI backend entry point.
    pub fn api_entry(&self) -> PathBuf {
        self.root.join("api").join("main.py")
    }

    /// Streamlit web interface.
    pub fn web_entry(&self) -> PathBuf {
        self.root.join("web").join("app.py")
    }

    /// Thin entry file used by cloud platforms that run Streamlit directly.
    pub fn cloud_entry(&self) -> PathBuf {
        self.root.join("streamlit_app.py")
    }

    pub fn engine(&self) -> PathBuf {
        self.root.join("core").join("aether_engine.py")
    }

    /// Full dependency manifest (`requirements.txt`).
    pub fn full_manifest(&self) -> PathBuf {
        self.root.join("requirements.txt")
    }

    /// Lightweight manifest for resource-constrained platforms.
    pub fn light_manifest(&self) -> PathBuf {
        self.root.join("requirements-streamlit.txt")
    }

    /// System package list consumed by Streamlit Cloud.
    pub fn system_packages(&self) -> PathBuf {
        self.root.join("packages.txt")
    }

    pub fn streamlit_config(&self) -> PathBuf {
        self.root.join(".streamlit").join("config.toml")
    }

    pub fn gitignore(&self) -> PathBuf {
        self.root.join(".gitignore")
    }

    /// In-tree secrets locations that must never be committed.
    pub fn tree_secret_files(&self) -> Vec<PathBuf> {
        vec![
            self.root.join("secrets.toml"),
            self.root.join(".streamlit").join("secrets.toml"),
            self.root.join(".env"),
        ]
    }

    /// Every file the deployment guides expect a complete repository to have.
    pub fn required_files(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("launcher script", self.launcher()),
            ("API entry point", self.api_entry()),
            ("web interface", self.web_entry()),
            ("cloud entry file", self.cloud_entry()),
            ("engine module", self.engine()),
            ("full manifest", self.full_manifest()),
            ("lightweight manifest", self.light_manifest()),
            ("system package list", self.system_packages()),
            ("Streamlit config", self.streamlit_config()),
        ]
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Interface theme colors, shared by the local launcher flags and the
/// generated `.streamlit/config.toml`.
pub mod theme {
    pub const PRIMARY: &str = "#667eea";
    pub const BACKGROUND: &str = "#f5f7fa";
    pub const SECONDARY_BACKGROUND: &str = "#ffffff";
    pub const TEXT: &str = "#262730";
}

/// Fixed service ports of the AETHER stack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServicePorts {
    pub api: u16,
    pub web: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            api: 8000,
            web: 8501,
        }
    }
}

impl ServicePorts {
    pub fn api_url(&self) -> String {
        format!("http://localhost:{}", self.api)
    }

    pub fn web_url(&self) -> String {
        format!("http://localhost:{}", self.web)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.api_url())
    }

    pub fn docs_url(&self) -> String {
        format!("{}/docs", self.api_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_rooted() {
        let layout = ProjectLayout::new("/tmp/aether");
        assert_eq!(layout.launcher(), PathBuf::from("/tmp/aether/run.py"));
        assert_eq!(
            layout.streamlit_config(),
            PathBuf::from("/tmp/aether/.streamlit/config.toml")
        );
    }

    #[test]
    fn required_files_cover_documented_paths() {
        let layout = ProjectLayout::new(".");
        let paths: Vec<String> = layout
            .required_files()
            .into_iter()
            .map(|(_, p)| p.to_string_lossy().into_owned())
            .collect();

        for expected in [
            "streamlit_app.py",
            "web/app.py",
            "requirements-streamlit.txt",
            "packages.txt",
            ".streamlit/config.toml",
        ] {
            assert!(
                paths.iter().any(|p| p.ends_with(expected)),
                "missing documented path: {expected}"
            );
        }
    }

    #[test]
    fn default_ports_match_container_interface() {
        let ports = ServicePorts::default();
        assert_eq!(ports.api, 8000);
        assert_eq!(ports.web, 8501);
        assert_eq!(ports.health_url(), "http://localhost:8000/health");
    }
}
