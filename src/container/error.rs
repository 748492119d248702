use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Docker is not installed or not on PATH. {instructions}")]
    DockerMissing { instructions: String },

    #[error("docker build failed: {stderr}")]
    BuildFailed { stderr: String },

    #[error("Invalid probe URL {url}: {reason}")]
    InvalidProbeUrl { url: String, reason: String },

    #[error("Template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
