pub mod builder;
pub mod error;
pub mod probe;
pub mod spec;

pub use builder::{BuildOutcome, ImageBuilder};
pub use error::{ContainerError, Result};
pub use probe::{HealthProbe, ProbeOutcome, ProbeStatus};
pub use spec::{ContainerSpec, EnvVar, HealthCheckSpec};
