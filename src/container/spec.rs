use crate::container::error::Result;
use crate::types::ServicePorts;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

const DOCKERFILE_TEMPLATE: &str = include_str!("../templates/dockerfile.template");
const DOCKERIGNORE: &str = include_str!("../templates/dockerignore.template");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Health check baked into the image: hit `/health` on the API port
/// every 30 seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    pub path: String,
    pub port: u16,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub start_period_secs: u64,
    pub retries: u32,
}

/// Everything that goes into the image build. The rendered Dockerfile is
/// hashed into the image tag, so a spec change always produces a new tag
/// and a built image is never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub base_image: String,
    pub system_packages: Vec<String>,
    pub manifest_file: String,
    pub env: Vec<EnvVar>,
    pub api_port: u16,
    pub web_port: u16,
    pub health: HealthCheckSpec,
    pub start_command: Vec<String>,
}

impl ContainerSpec {
    pub fn new(ports: ServicePorts) -> Self {
        let env = vec![
            EnvVar {
                name: "AETHER_ENV".to_string(),
                value: "production".to_string(),
            },
            EnvVar {
                name: "API_HOST".to_string(),
                value: "0.0.0.0".to_string(),
            },
            EnvVar {
                name: "API_PORT".to_string(),
                value: ports.api.to_string(),
            },
            EnvVar {
                name: "WEB_PORT".to_string(),
                value: ports.web.to_string(),
            },
            EnvVar {
                name: "PYTHONUNBUFFERED".to_string(),
                value: "1".to_string(),
            },
        ];

        Self {
            base_image: "python:3.11-slim".to_string(),
            system_packages: vec![
                "build-essential".to_string(),
                "curl".to_string(),
                "git".to_string(),
            ],
            manifest_file: "requirements.txt".to_string(),
            env,
            api_port: ports.api,
            web_port: ports.web,
            health: HealthCheckSpec {
                path: "/health".to_string(),
                port: ports.api,
                interval_secs: 30,
                timeout_secs: 10,
                start_period_secs: 40,
                retries: 3,
            },
            start_command: vec![
                "python".to_string(),
                "run.py".to_string(),
                "--no-browser".to_string(),
            ],
        }
    }

    pub fn render_dockerfile(&self) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string("dockerfile", DOCKERFILE_TEMPLATE)
            .map_err(Box::new)?;

        let start_exec = self
            .start_command
            .iter()
            .map(|part| format!("\"{part}\""))
            .collect::<Vec<_>>()
            .join(", ");

        let context = json!({
            "base_image": self.base_image,
            "system_packages": self.system_packages,
            "manifest_file": self.manifest_file,
            "env": self.env,
            "api_port": self.api_port,
            "web_port": self.web_port,
            "health": self.health,
            "start_exec": start_exec,
        });

        Ok(handlebars.render("dockerfile", &context)?)
    }

    pub fn render_dockerignore(&self) -> String {
        DOCKERIGNORE.to_string()
    }

    /// Content-addressed tag: same spec, same tag.
    pub fn image_tag(&self, image_name: &str) -> Result<String> {
        let rendered = self.render_dockerfile()?;
        let mut hasher = Sha256::new();
        hasher.update(rendered.as_bytes());
        let digest = hasher.finalize();
        let short: String = digest
            .iter()
            .take(6)
            .map(|b| format!("{b:02x}"))
            .collect();
        Ok(format!("{image_name}:{short}"))
    }

    /// Write `Dockerfile` and `.dockerignore` under `root`.
    pub async fn write_artifacts(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let dockerfile = root.join("Dockerfile");
        let dockerignore = root.join(".dockerignore");

        tokio::fs::write(&dockerfile, self.render_dockerfile()?).await?;
        tokio::fs::write(&dockerignore, self.render_dockerignore()).await?;

        info!(path = %dockerfile.display(), "container artifacts written");
        Ok(vec![dockerfile, dockerignore])
    }
}

impl Default for ContainerSpec {
    fn default() -> Self {
        Self::new(ServicePorts::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dockerfile_exposes_both_service_ports() {
        let rendered = ContainerSpec::default().render_dockerfile().unwrap();
        assert!(rendered.contains("EXPOSE 8000 8501"));
    }

    #[test]
    fn dockerfile_sets_documented_environment() {
        let rendered = ContainerSpec::default().render_dockerfile().unwrap();
        for line in [
            "ENV AETHER_ENV=production",
            "ENV API_HOST=0.0.0.0",
            "ENV API_PORT=8000",
            "ENV WEB_PORT=8501",
            "ENV PYTHONUNBUFFERED=1",
        ] {
            assert!(rendered.contains(line), "missing: {line}");
        }
    }

    #[test]
    fn health_check_polls_every_thirty_seconds() {
        let rendered = ContainerSpec::default().render_dockerfile().unwrap();
        assert!(rendered.contains("HEALTHCHECK --interval=30s"));
        assert!(rendered.contains("curl -f http://localhost:8000/health"));
    }

    #[test]
    fn start_command_renders_as_exec_form() {
        let rendered = ContainerSpec::default().render_dockerfile().unwrap();
        assert!(rendered.contains("CMD [\"python\", \"run.py\", \"--no-browser\"]"));
    }

    #[test]
    fn system_packages_install_in_one_layer() {
        let rendered = ContainerSpec::default().render_dockerfile().unwrap();
        assert!(rendered.contains("build-essential"));
        assert!(rendered.contains("rm -rf /var/lib/apt/lists/*"));
    }

    #[test]
    fn image_tag_is_stable_and_spec_sensitive() {
        let spec = ContainerSpec::default();
        let tag_a = spec.image_tag("aether").unwrap();
        let tag_b = spec.image_tag("aether").unwrap();
        assert_eq!(tag_a, tag_b);
        assert!(tag_a.starts_with("aether:"));
        assert_eq!(tag_a.len(), "aether:".len() + 12);

        let mut changed = ContainerSpec::default();
        changed.base_image = "python:3.12-slim".to_string();
        assert_ne!(changed.image_tag("aether").unwrap(), tag_a);
    }

    #[test]
    fn dockerignore_excludes_secrets() {
        let ignore = ContainerSpec::default().render_dockerignore();
        assert!(ignore.contains("secrets.toml"));
        assert!(ignore.contains(".env"));
        assert!(ignore.contains(".git"));
    }

    #[tokio::test]
    async fn write_artifacts_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let written = ContainerSpec::default()
            .write_artifacts(dir.path())
            .await
            .unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("Dockerfile").exists());
        assert!(dir.path().join(".dockerignore").exists());
    }
}
