pub mod commands;
pub mod options;
pub mod output;
pub mod wizard;

pub use commands::*;
pub use options::*;
pub use output::*;
pub use wizard::*;
