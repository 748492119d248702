use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReleaseError>;

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("preflight failed: {0}")]
    Preflight(#[from] crate::preflight::PreflightError),

    #[error("repository stage failed: {0}")]
    Repo(#[from] crate::repo::RepoError),

    #[error("manifest stage failed: {0}")]
    Manifest(#[from] crate::manifest::ManifestError),

    #[error("platform artifacts failed: {0}")]
    Platform(#[from] crate::platform::PlatformError),

    #[error("secrets stage failed: {0}")]
    Secrets(#[from] crate::secrets::SecretError),

    #[error("container stage failed: {0}")]
    Container(#[from] crate::container::ContainerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
