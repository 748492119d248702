pub mod error;
pub mod store;

pub use error::{Result, SecretError};
pub use store::{SecretProblem, SecretStore};
