use crate::container::error::{ContainerError, Result};
use crate::container::spec::ContainerSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub tag: String,
    pub duration_secs: u64,
}

/// Runs `docker build` against the rendered artifacts.
pub struct ImageBuilder {
    image_name: String,
}

impl ImageBuilder {
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
        }
    }

    pub async fn build(&self, root: &Path, spec: &ContainerSpec) -> Result<BuildOutcome> {
        which::which("docker").map_err(|_| ContainerError::DockerMissing {
            instructions: "Install Docker from https://docs.docker.com/get-docker/ or use a \
                           platform target instead of the container path."
                .to_string(),
        })?;

        spec.write_artifacts(root).await?;
        let tag = spec.image_tag(&self.image_name)?;

        debug!(tag = %tag, context = %root.display(), "starting docker build");
        let started = Instant::now();
        let output = Command::new("docker")
            .args(["build", "-t", &tag, "."])
            .current_dir(root)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(15)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ContainerError::BuildFailed { stderr: tail });
        }

        let duration = started.elapsed();
        info!(tag = %tag, secs = duration.as_secs(), "image built");
        Ok(BuildOutcome {
            tag,
            duration_secs: duration.as_secs(),
        })
    }
}
