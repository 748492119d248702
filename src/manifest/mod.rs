pub mod error;
pub mod footprint;
pub mod imports;
pub mod manifest;
pub mod requirement;
pub mod resolver;

pub use error::{ManifestError, Result};
pub use footprint::{FootprintCatalog, FootprintEstimate, PackageEstimate};
pub use imports::{CoverageReport, ImportScan, ImportScanner, MissingImport, ScannedImport};
pub use manifest::Manifest;
pub use requirement::{CompareOp, Requirement, VersionConstraint};
pub use resolver::{ManifestResolution, ManifestResolver, OversizedDependency};
