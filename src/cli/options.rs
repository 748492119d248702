use crate::launch::LaunchMode;
use crate::types::PlatformKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Deployment workflows for the AETHER project.
#[derive(Parser)]
#[command(name = "aether-deploy")]
#[command(about = "Prepare, verify, and publish AETHER deployments")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct AetherDeployCli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, default_value = ".")]
    pub project_root: PathBuf,

    /// Secrets file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    pub secrets_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify the work tree against a deployment target
    Check {
        /// Target platform (interactive picker when omitted)
        #[arg(short, long, value_enum)]
        target: Option<PlatformKind>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the supported deployment targets
    Targets {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize version control and commit the work tree
    Init {
        /// Commit message
        #[arg(short, long, default_value = "Deploy AETHER")]
        message: String,
    },

    /// Push the prepared repository to its remote
    Publish {
        /// Create the repository first with gh (name or owner/name)
        #[arg(long)]
        repo: Option<String>,

        /// Link this remote URL instead of creating a repository
        #[arg(long)]
        remote_url: Option<String>,

        /// Create the repository as private
        #[arg(long)]
        private: bool,
    },

    /// Resolve the manifest for a target and check its footprint
    Manifest {
        /// Target platform (interactive picker when omitted)
        #[arg(short, long, value_enum)]
        target: Option<PlatformKind>,

        /// Also verify that requirements.txt covers every import
        #[arg(long)]
        verify_imports: bool,
    },

    /// Manage deployment secrets
    Secrets {
        #[command(subcommand)]
        action: SecretsAction,
    },

    /// Write container build files, optionally build the image
    Container {
        /// Build the image with docker after writing the files
        #[arg(long)]
        build: bool,

        /// Image name
        #[arg(long, default_value = "aether")]
        image: String,
    },

    /// Probe a deployment's health endpoint
    Probe {
        /// URL to probe (defaults to the local API health endpoint)
        url: Option<String>,

        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Run the API and web interface locally
    Launch {
        #[arg(long, value_enum, default_value = "full")]
        mode: LaunchMode,

        #[arg(long, default_value = "8000")]
        api_port: u16,

        #[arg(long, default_value = "8501")]
        web_port: u16,

        /// Do not open the browser once the services are up
        #[arg(long)]
        no_browser: bool,
    },

    /// Run the whole release pipeline for a target
    Release {
        /// Target platform (interactive picker when omitted)
        #[arg(short, long, value_enum)]
        target: Option<PlatformKind>,

        /// Commit message for the prepare stage
        #[arg(short, long, default_value = "Deploy AETHER")]
        message: String,

        /// Push to the remote at the end
        #[arg(long)]
        push: bool,

        /// Create the GitHub repository first (name or owner/name)
        #[arg(long)]
        repo: Option<String>,

        /// Existing remote URL to push to
        #[arg(long)]
        remote_url: Option<String>,

        /// Create the repository as private
        #[arg(long)]
        private: bool,

        /// Also write container build files
        #[arg(long)]
        container: bool,

        /// Replace platform files whose contents differ
        #[arg(long)]
        force: bool,

        /// Log what would happen without writing anything
        #[arg(long)]
        dry_run: bool,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum SecretsAction {
    /// Show which secrets are set (values stay masked)
    Show,

    /// Set one secret
    Set { key: String, value: String },

    /// Print the dashboard paste block for a target
    Render {
        #[arg(short, long, value_enum)]
        target: Option<PlatformKind>,
    },

    /// Print the secrets file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
