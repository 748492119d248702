use crate::types::target::PlatformKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Identity of one release pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub release_id: String,
    pub created_at: DateTime<Utc>,
    pub tool_version: String,
}

impl ReleaseMetadata {
    pub fn generate() -> Self {
        Self {
            release_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// What a release run should do. Built by the CLI, consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasePlan {
    pub metadata: ReleaseMetadata,
    pub target: PlatformKind,
    pub commit_message: String,
    /// Push to the remote after preparation. Off by default; publishing is
    /// an explicit operator decision.
    pub push: bool,
    /// GitHub repository to create via `gh` (owner/name or bare name).
    pub create_repo: Option<String>,
    pub remote_url: Option<String>,
    pub private_repo: bool,
    /// Also render container build artifacts.
    pub container: bool,
    /// Overwrite platform files that already exist with different contents.
    pub force: bool,
    pub secrets_file: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Skipped,
    Failed,
}

/// Result of one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: String,
    pub status: StageStatus,
    pub detail: Option<String>,
    #[serde(with = "serde_duration")]
    pub duration: Duration,
    pub artifacts: Vec<PathBuf>,
}

impl StageOutcome {
    pub fn completed(stage: &str, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Completed,
            detail: Some(detail.into()),
            duration: Duration::ZERO,
            artifacts: Vec::new(),
        }
    }

    pub fn skipped(stage: &str, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Skipped,
            detail: Some(reason.into()),
            duration: Duration::ZERO,
            artifacts: Vec::new(),
        }
    }

    pub fn failed(stage: &str, error: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Failed,
            detail: Some(error.into()),
            duration: Duration::ZERO,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.artifacts = artifacts;
        self
    }
}

/// Full record of a release run, printable as text or JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseReport {
    pub metadata: ReleaseMetadata,
    pub target: PlatformKind,
    pub dry_run: bool,
    pub outcomes: Vec<StageOutcome>,
    pub success: bool,
}

impl ReleaseReport {
    pub fn failed_stage(&self) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.status == StageStatus::Failed)
    }
}

mod serde_duration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_ids_are_unique() {
        let a = ReleaseMetadata::generate();
        let b = ReleaseMetadata::generate();
        assert_ne!(a.release_id, b.release_id);
    }

    #[test]
    fn failed_stage_is_found() {
        let report = ReleaseReport {
            metadata: ReleaseMetadata::generate(),
            target: PlatformKind::Render,
            dry_run: false,
            outcomes: vec![
                StageOutcome::completed("preflight", "ok"),
                StageOutcome::failed("publish", "push rejected"),
            ],
            success: false,
        };
        assert_eq!(report.failed_stage().unwrap().stage, "publish");
    }

    #[test]
    fn outcome_serializes_duration_as_millis() {
        let mut outcome = StageOutcome::completed("prepare", "ok");
        outcome.duration = Duration::from_millis(1500);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["duration"], 1500);
    }
}
