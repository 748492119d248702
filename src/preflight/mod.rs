pub mod environment;
pub mod error;
pub mod project;
pub mod toolchain;

pub use environment::EnvironmentInfo;
pub use error::{PreflightError, Result};
pub use project::{CheckFinding, CheckReport, ProjectChecker, Severity};
pub use toolchain::{ToolReport, ToolStatus, ToolchainDetector, ToolchainReport};
