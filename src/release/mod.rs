pub mod error;
pub mod pipeline;
pub mod stage;
pub mod stages;

pub use error::{ReleaseError, Result};
pub use pipeline::ReleasePipeline;
pub use stage::{ReleaseContext, ReleaseStage};
pub use stages::{
    ArtifactsStage, ManifestStage, PreflightStage, PrepareStage, PublishStage, SecretsStage,
};
