use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

/// Availability of one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum ToolStatus {
    Available { version: String },
    Missing,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ToolStatus::Available { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolReport {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
    pub status: ToolStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolchainReport {
    pub tools: Vec<ToolReport>,
}

impl ToolchainReport {
    pub fn status(&self, name: &str) -> Option<&ToolStatus> {
        self.tools.iter().find(|t| t.name == name).map(|t| &t.status)
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.status(name).is_some_and(ToolStatus::is_available)
    }

    pub fn missing(&self) -> impl Iterator<Item = &ToolReport> {
        self.tools.iter().filter(|t| !t.status.is_available())
    }
}

/// External tools the workflows lean on. Only `git` is ever a hard
/// requirement, and only when publishing.
const TOOLS: &[(&str, &str, &str)] = &[
    (
        "git",
        "commit the work tree and push it to the remote",
        "install from https://git-scm.com/downloads",
    ),
    (
        "gh",
        "create the GitHub repository from the terminal",
        "install from https://cli.github.com",
    ),
    (
        "docker",
        "build and run the container image",
        "install from https://docs.docker.com/get-docker/",
    ),
    (
        "python3",
        "run the API and web services locally",
        "install from https://www.python.org/downloads/",
    ),
];

pub struct ToolchainDetector;

impl ToolchainDetector {
    /// Probe every tool the workflows use.
    pub async fn detect() -> ToolchainReport {
        let mut tools = Vec::with_capacity(TOOLS.len());
        for &(name, purpose, install_hint) in TOOLS {
            let status = Self::probe(name).await;
            debug!(tool = name, ?status, "probed tool");
            tools.push(ToolReport {
                name,
                purpose,
                install_hint,
                status,
            });
        }
        ToolchainReport { tools }
    }

    /// Presence via PATH lookup, version via `--version`. A tool that is
    /// on PATH but will not report a version still counts as available.
    pub async fn probe(tool: &str) -> ToolStatus {
        let Ok(path) = which::which(tool) else {
            return ToolStatus::Missing;
        };

        let version = match Command::new(&path).arg("--version").output().await {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .unwrap_or("unknown")
                    .trim()
                    .to_string()
            }
            _ => "unknown".to_string(),
        };

        ToolStatus::Available { version }
    }
}
