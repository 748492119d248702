use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{tool} is not installed or not on PATH. {instructions}")]
    ToolMissing { tool: String, instructions: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("No remote configured; pass --repo to create one with gh or --remote-url to link an existing repository")]
    NoRemote,

    #[error("Background git task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RepoError>;
