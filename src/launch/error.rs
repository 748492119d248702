use thiserror::Error;

pub type Result<T> = std::result::Result<T, LaunchError>;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("python interpreter not found: {instructions}")]
    InterpreterMissing { instructions: String },

    #[error("entry file not found: {path}")]
    MissingEntry { path: std::path::PathBuf },

    #[error("failed to start {service}: {source}")]
    SpawnFailed {
        service: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{service} failed to start: {detail}")]
    StartupFailed { service: String, detail: String },

    #[error("{service} exited unexpectedly ({status})")]
    ServiceExited { service: String, status: String },

    #[error("health probe error: {0}")]
    Probe(#[from] crate::container::ContainerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
