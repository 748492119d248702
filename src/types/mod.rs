pub mod project;
pub mod release;
pub mod target;

pub use project::*;
pub use release::*;
pub use target::*;
