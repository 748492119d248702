use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreflightError>;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("manifest check failed: {0}")]
    Manifest(#[from] crate::manifest::ManifestError),

    #[error("secrets check failed: {0}")]
    Secrets(#[from] crate::secrets::SecretError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
