use crate::platform::registry;
use crate::release::error::Result;
use crate::release::stage::{ReleaseContext, ReleaseStage};
use crate::release::stages::{
    ArtifactsStage, ManifestStage, PreflightStage, PrepareStage, PublishStage, SecretsStage,
};
use crate::secrets::SecretStore;
use crate::types::{
    ProjectLayout, ReleasePlan, ReleaseReport, ServicePorts, StageOutcome, StageStatus,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs the release stages strictly in order. A failed stage halts the
/// run; the stages after it are recorded as skipped.
pub struct ReleasePipeline {
    stages: Vec<Box<dyn ReleaseStage>>,
}

impl ReleasePipeline {
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Box::new(PreflightStage),
                Box::new(PrepareStage),
                Box::new(ManifestStage),
                Box::new(ArtifactsStage),
                Box::new(SecretsStage),
                Box::new(PublishStage),
            ],
        }
    }

    pub async fn run(&self, layout: ProjectLayout, plan: ReleasePlan) -> Result<ReleaseReport> {
        let target = registry::descriptor(plan.target);
        let secrets_path = match &plan.secrets_file {
            Some(path) => path.clone(),
            None => SecretStore::default_path()?,
        };
        let secrets = SecretStore::load_or_empty(&secrets_path).await?;

        info!(
            release_id = %plan.metadata.release_id,
            target = %plan.target,
            dry_run = plan.dry_run,
            "starting release"
        );

        let mut ctx = ReleaseContext {
            plan,
            layout,
            target,
            ports: ServicePorts::default(),
            secrets,
            resolution: None,
            written: Vec::new(),
            commit: None,
        };

        let mut outcomes: Vec<StageOutcome> = Vec::with_capacity(self.stages.len());
        let mut halted = false;

        for stage in &self.stages {
            if halted {
                outcomes.push(StageOutcome::skipped(
                    stage.name(),
                    "not reached, an earlier stage failed",
                ));
                continue;
            }

            info!(stage = stage.name(), "running stage");
            let started = Instant::now();
            let mut outcome = match stage.run(&mut ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(stage = stage.name(), error = %e, "stage error");
                    StageOutcome::failed(stage.name(), e.to_string())
                }
            };
            outcome.duration = started.elapsed();

            if outcome.status == StageStatus::Failed {
                warn!(
                    stage = stage.name(),
                    detail = outcome.detail.as_deref().unwrap_or(""),
                    "stage failed, halting"
                );
                halted = true;
            }
            outcomes.push(outcome);
        }

        let success = !outcomes.iter().any(|o| o.status == StageStatus::Failed);
        let report = ReleaseReport {
            metadata: ctx.plan.metadata.clone(),
            target: ctx.plan.target,
            dry_run: ctx.plan.dry_run,
            outcomes,
            success,
        };
        info!(release_id = %report.metadata.release_id, success, "release finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlatformKind, ReleaseMetadata};
    use async_trait::async_trait;

    struct FailingStage;

    #[async_trait]
    impl ReleaseStage for FailingStage {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, _ctx: &mut ReleaseContext) -> Result<StageOutcome> {
            Ok(StageOutcome::failed(self.name(), "nope"))
        }
    }

    struct PassingStage;

    #[async_trait]
    impl ReleaseStage for PassingStage {
        fn name(&self) -> &'static str {
            "passing"
        }

        async fn run(&self, _ctx: &mut ReleaseContext) -> Result<StageOutcome> {
            Ok(StageOutcome::completed(self.name(), "fine"))
        }
    }

    fn plan_for(dir: &std::path::Path) -> ReleasePlan {
        ReleasePlan {
            metadata: ReleaseMetadata::generate(),
            target: PlatformKind::Replit,
            commit_message: "Deploy AETHER".to_string(),
            push: false,
            create_repo: None,
            remote_url: None,
            private_repo: false,
            container: false,
            force: false,
            secrets_file: Some(dir.join("store.toml")),
            dry_run: true,
        }
    }

    #[tokio::test]
    async fn failure_halts_and_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReleasePipeline {
            stages: vec![Box::new(FailingStage), Box::new(PassingStage)],
        };

        let report = pipeline
            .run(ProjectLayout::new(dir.path()), plan_for(dir.path()))
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].status, StageStatus::Failed);
        assert_eq!(report.outcomes[1].status, StageStatus::Skipped);
        assert_eq!(report.failed_stage().unwrap().stage, "failing");
    }

    #[tokio::test]
    async fn all_passing_stages_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReleasePipeline {
            stages: vec![Box::new(PassingStage), Box::new(PassingStage)],
        };

        let report = pipeline
            .run(ProjectLayout::new(dir.path()), plan_for(dir.path()))
            .await
            .unwrap();

        assert!(report.success);
        assert!(report.outcomes.iter().all(|o| o.status == StageStatus::Completed));
        assert!(report.outcomes.iter().all(|o| o.duration.as_secs() < 5));
    }
}
