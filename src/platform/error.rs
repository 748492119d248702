use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Failed to render {artifact}: {reason}")]
    RenderFailed { artifact: String, reason: String },

    #[error("Failed to write artifact {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlatformError>;
