pub mod error;
pub mod preparer;
pub mod publisher;

pub use error::{RepoError, Result};
pub use preparer::{PrepareOutcome, RepoPreparer, IGNORE_RULES};
pub use publisher::{PublishOptions, PublishOutcome, RemotePublisher};
