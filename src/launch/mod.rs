pub mod error;
pub mod launcher;

pub use error::{LaunchError, Result};
pub use launcher::{LaunchMode, Launcher};
