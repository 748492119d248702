use crate::platform::error::{PlatformError, Result};
use crate::types::{theme, PlatformKind, ServicePorts, TargetDescriptor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A platform configuration file ready to be written into the work tree.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub relative_path: PathBuf,
    pub contents: String,
    pub purpose: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Created,
    Updated,
    Unchanged,
    SkippedExisting,
}

/// Render the config files a platform reads from the repository.
pub fn render_artifacts(
    target: &TargetDescriptor,
    ports: ServicePorts,
) -> Result<Vec<RenderedArtifact>> {
    match target.kind {
        PlatformKind::StreamlitCloud => streamlit_cloud_artifacts(ports),
        PlatformKind::Render => render_blueprint(target),
        PlatformKind::Replit => replit_artifacts(target),
        PlatformKind::HuggingFaceSpaces => hugging_face_artifacts(target),
    }
}

/// Write artifacts under `root`. Existing files are only replaced when
/// `overwrite` is set; an unchanged file is left alone either way.
pub async fn write_artifacts(
    root: &Path,
    artifacts: &[RenderedArtifact],
    overwrite: bool,
) -> Result<Vec<(PathBuf, ArtifactStatus)>> {
    let mut written = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = root.join(&artifact.relative_path);
        let status = if path.exists() {
            let existing = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            if existing == artifact.contents {
                ArtifactStatus::Unchanged
            } else if overwrite {
                ArtifactStatus::Updated
            } else {
                warn!(
                    path = %artifact.relative_path.display(),
                    "file exists with different contents, keeping it (use --force to replace)"
                );
                ArtifactStatus::SkippedExisting
            }
        } else {
            ArtifactStatus::Created
        };

        if matches!(status, ArtifactStatus::Created | ArtifactStatus::Updated) {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    PlatformError::WriteFailed {
                        path: path.clone(),
                        source,
                    }
                })?;
            }
            tokio::fs::write(&path, &artifact.contents)
                .await
                .map_err(|source| PlatformError::WriteFailed {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %artifact.relative_path.display(), "artifact written");
        }

        written.push((artifact.relative_path.clone(), status));
    }

    Ok(written)
}

#[derive(Debug, Serialize, Deserialize)]
struct StreamlitConfig {
    server: StreamlitServer,
    theme: StreamlitTheme,
}

#[derive(Debug, Serialize, Deserialize)]
struct StreamlitServer {
    headless: bool,
    port: u16,
    address: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamlitTheme {
    primary_color: String,
    background_color: String,
    secondary_background_color: String,
    text_color: String,
}

fn streamlit_cloud_artifacts(ports: ServicePorts) -> Result<Vec<RenderedArtifact>> {
    let config = StreamlitConfig {
        server: StreamlitServer {
            headless: true,
            port: ports.web,
            address: "0.0.0.0".to_string(),
        },
        theme: StreamlitTheme {
            primary_color: theme::PRIMARY.to_string(),
            background_color: theme::BACKGROUND.to_string(),
            secondary_background_color: theme::SECONDARY_BACKGROUND.to_string(),
            text_color: theme::TEXT.to_string(),
        },
    };

    Ok(vec![
        RenderedArtifact {
            relative_path: PathBuf::from(".streamlit/config.toml"),
            contents: toml::to_string_pretty(&config)?,
            purpose: "Streamlit server and theme settings".to_string(),
        },
        RenderedArtifact {
            relative_path: PathBuf::from("packages.txt"),
            contents: "build-essential\ncurl\n".to_string(),
            purpose: "system packages installed by Streamlit Cloud".to_string(),
        },
    ])
}

#[derive(Debug, Serialize, Deserialize)]
struct RenderBlueprint {
    services: Vec<RenderService>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderService {
    #[serde(rename = "type")]
    service_type: String,
    name: String,
    runtime: String,
    plan: String,
    build_command: String,
    start_command: String,
    health_check_path: String,
    env_vars: Vec<RenderEnvVar>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RenderEnvVar {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    /// `sync: false` marks a secret entered in the dashboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<bool>,
}

fn render_blueprint(target: &TargetDescriptor) -> Result<Vec<RenderedArtifact>> {
    let blueprint = RenderBlueprint {
        services: vec![RenderService {
            service_type: "web".to_string(),
            name: "aether-api".to_string(),
            runtime: "python".to_string(),
            plan: "free".to_string(),
            build_command: target
                .build_command
                .clone()
                .unwrap_or_else(|| format!("pip install -r {}", target.manifest_file())),
            start_command: target.start_command.clone(),
            health_check_path: "/health".to_string(),
            env_vars: vec![
                RenderEnvVar {
                    key: "AETHER_ENV".to_string(),
                    value: Some("production".to_string()),
                    sync: None,
                },
                RenderEnvVar {
                    key: "OPENAI_API_KEY".to_string(),
                    value: None,
                    sync: Some(false),
                },
            ],
        }],
    };

    Ok(vec![RenderedArtifact {
        relative_path: PathBuf::from("render.yaml"),
        contents: serde_yaml::to_string(&blueprint)?,
        purpose: "Render service blueprint".to_string(),
    }])
}

#[derive(Debug, Serialize, Deserialize)]
struct ReplitConfig {
    run: String,
    entrypoint: String,
    env: ReplitEnv,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct ReplitEnv {
    aether_env: String,
}

fn replit_artifacts(target: &TargetDescriptor) -> Result<Vec<RenderedArtifact>> {
    let config = ReplitConfig {
        run: target.start_command.clone(),
        entrypoint: target.entry_file.clone(),
        env: ReplitEnv {
            aether_env: "production".to_string(),
        },
    };

    Ok(vec![RenderedArtifact {
        relative_path: PathBuf::from(".replit"),
        contents: toml::to_string_pretty(&config)?,
        purpose: "Replit run configuration".to_string(),
    }])
}

#[derive(Debug, Serialize, Deserialize)]
struct SpaceFrontMatter {
    title: String,
    emoji: String,
    #[serde(rename = "colorFrom")]
    color_from: String,
    #[serde(rename = "colorTo")]
    color_to: String,
    sdk: String,
    app_file: String,
    pinned: bool,
}

fn hugging_face_artifacts(target: &TargetDescriptor) -> Result<Vec<RenderedArtifact>> {
    let front_matter = SpaceFrontMatter {
        title: "AETHER".to_string(),
        emoji: "🧠".to_string(),
        color_from: "indigo".to_string(),
        color_to: "purple".to_string(),
        sdk: "streamlit".to_string(),
        app_file: target.entry_file.clone(),
        pinned: false,
    };

    let contents = format!(
        "---\n{}---\n\n# AETHER\n\nAdvanced Engine for Thought, Heuristic Emotion and Reasoning.\n\n\
         Set `API_URL` under Settings -> Variables and secrets so the interface\n\
         can reach the deployed backend.\n",
        serde_yaml::to_string(&front_matter)?
    );

    Ok(vec![RenderedArtifact {
        relative_path: PathBuf::from("README.md"),
        contents,
        purpose: "Space metadata front matter".to_string(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::registry;

    #[test]
    fn streamlit_cloud_writes_documented_files() {
        let target = registry::descriptor(PlatformKind::StreamlitCloud);
        let artifacts = render_artifacts(target, ServicePorts::default()).unwrap();
        let paths: Vec<String> = artifacts
            .iter()
            .map(|a| a.relative_path.to_string_lossy().into_owned())
            .collect();

        assert!(paths.contains(&".streamlit/config.toml".to_string()));
        assert!(paths.contains(&"packages.txt".to_string()));

        let config = &artifacts[0].contents;
        assert!(config.contains("headless = true"));
        assert!(config.contains("#667eea"));
    }

    #[test]
    fn render_blueprint_carries_health_check_and_commands() {
        let target = registry::descriptor(PlatformKind::Render);
        let artifacts = render_artifacts(target, ServicePorts::default()).unwrap();
        assert_eq!(artifacts.len(), 1);

        let yaml = &artifacts[0].contents;
        assert!(yaml.contains("healthCheckPath: /health"));
        assert!(yaml.contains("uvicorn api.main:app"));
        assert!(yaml.contains("sync: false"));
    }

    #[test]
    fn replit_config_runs_the_launcher() {
        let target = registry::descriptor(PlatformKind::Replit);
        let artifacts = render_artifacts(target, ServicePorts::default()).unwrap();
        let config = &artifacts[0].contents;
        assert!(config.contains("run = \"python run.py --no-browser\""));
        assert!(config.contains("AETHER_ENV"));
    }

    #[test]
    fn space_front_matter_uses_streamlit_sdk() {
        let target = registry::descriptor(PlatformKind::HuggingFaceSpaces);
        let artifacts = render_artifacts(target, ServicePorts::default()).unwrap();
        let readme = &artifacts[0].contents;
        assert!(readme.starts_with("---\n"));
        assert!(readme.contains("sdk: streamlit"));
        assert!(readme.contains("app_file: streamlit_app.py"));
        assert!(readme.contains("colorFrom: indigo"));
    }

    #[tokio::test]
    async fn write_skips_existing_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("render.yaml"), "custom: true\n").unwrap();

        let target = registry::descriptor(PlatformKind::Render);
        let artifacts = render_artifacts(target, ServicePorts::default()).unwrap();
        let written = write_artifacts(dir.path(), &artifacts, false).await.unwrap();

        assert_eq!(written[0].1, ArtifactStatus::SkippedExisting);
        let kept = std::fs::read_to_string(dir.path().join("render.yaml")).unwrap();
        assert_eq!(kept, "custom: true\n");
    }

    #[tokio::test]
    async fn write_creates_and_reports_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let target = registry::descriptor(PlatformKind::StreamlitCloud);
        let artifacts = render_artifacts(target, ServicePorts::default()).unwrap();

        let first = write_artifacts(dir.path(), &artifacts, false).await.unwrap();
        assert!(first.iter().all(|(_, s)| *s == ArtifactStatus::Created));

        let second = write_artifacts(dir.path(), &artifacts, false).await.unwrap();
        assert!(second.iter().all(|(_, s)| *s == ArtifactStatus::Unchanged));
    }
}
