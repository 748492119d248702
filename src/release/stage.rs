use crate::manifest::ManifestResolution;
use crate::platform::ArtifactStatus;
use crate::release::error::Result;
use crate::secrets::SecretStore;
use crate::types::{ProjectLayout, ReleasePlan, ServicePorts, StageOutcome, TargetDescriptor};
use async_trait::async_trait;
use std::path::PathBuf;

/// State threaded through the pipeline. Stages read what earlier stages
/// produced and record what they did.
pub struct ReleaseContext {
    pub plan: ReleasePlan,
    pub layout: ProjectLayout,
    pub target: &'static TargetDescriptor,
    pub ports: ServicePorts,
    pub secrets: SecretStore,
    pub resolution: Option<ManifestResolution>,
    pub written: Vec<(PathBuf, ArtifactStatus)>,
    pub commit: Option<String>,
}

impl ReleaseContext {
    pub fn dry_run(&self) -> bool {
        self.plan.dry_run
    }
}

/// One step of the release pipeline.
///
/// A stage reports domain failures through a `Failed` outcome; `Err` is
/// for the unexpected (IO, subprocess plumbing). The pipeline halts on
/// both.
#[async_trait]
pub trait ReleaseStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &mut ReleaseContext) -> Result<StageOutcome>;
}
