pub mod artifacts;
pub mod error;
pub mod registry;

pub use artifacts::{render_artifacts, write_artifacts, ArtifactStatus, RenderedArtifact};
pub use error::{PlatformError, Result};
pub use registry::{descriptor, registry};
