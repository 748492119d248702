use crate::manifest::error::Result;
use crate::manifest::footprint::FootprintCatalog;
use crate::manifest::manifest::Manifest;
use crate::types::{ManifestVariant, ProjectLayout, TargetDescriptor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Packages above this size get called out individually when a manifest
/// does not fit its platform.
const OVERSIZED_THRESHOLD_MIB: u64 = 200;

/// A package that keeps the manifest from fitting the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OversizedDependency {
    pub name: String,
    pub estimated_mib: u64,
    pub remediation: String,
}

/// Outcome of resolving a manifest against a deployment target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestResolution {
    pub variant: ManifestVariant,
    pub manifest_path: PathBuf,
    pub requirement_count: usize,
    pub estimated_mib: u64,
    pub ceiling_mib: u64,
    pub fits: bool,
    pub oversized: Vec<OversizedDependency>,
}

impl ManifestResolution {
    /// One-line summary for stage reports.
    pub fn summary(&self) -> String {
        format!(
            "{} ({} packages, ~{} MiB of {} MiB ceiling)",
            self.variant, self.requirement_count, self.estimated_mib, self.ceiling_mib
        )
    }
}

/// Picks the requirements file a target installs from and checks it
/// against the target's memory ceiling.
#[derive(Debug, Default)]
pub struct ManifestResolver {
    catalog: FootprintCatalog,
}

impl ManifestResolver {
    pub fn new() -> Self {
        Self {
            catalog: FootprintCatalog::new(),
        }
    }

    pub async fn resolve(
        &self,
        layout: &ProjectLayout,
        target: &TargetDescriptor,
    ) -> Result<ManifestResolution> {
        let manifest_path = match target.manifest {
            ManifestVariant::Full => layout.full_manifest(),
            ManifestVariant::Lightweight => layout.light_manifest(),
        };

        debug!(path = %manifest_path.display(), "loading manifest");
        let manifest = Manifest::load(&manifest_path).await?;
        Ok(self.evaluate(&manifest, target))
    }

    /// Estimate a loaded manifest against the target ceiling.
    pub fn evaluate(&self, manifest: &Manifest, target: &TargetDescriptor) -> ManifestResolution {
        let estimate = self.catalog.estimate(manifest);
        let ceiling_mib = target.ceiling.memory_mib;
        let fits = estimate.total_mib <= ceiling_mib;

        let oversized = if fits {
            Vec::new()
        } else {
            estimate
                .heaviest(OVERSIZED_THRESHOLD_MIB)
                .into_iter()
                .map(|p| OversizedDependency {
                    name: p.name.clone(),
                    estimated_mib: p.estimated_mib,
                    remediation: match &p.alternative {
                        Some(alt) => format!(
                            "swap to the API-based alternative ({alt}) and set OPENAI_API_KEY"
                        ),
                        None => format!(
                            "remove it or deploy to a platform with more than {} MiB",
                            target.ceiling.memory_mib
                        ),
                    },
                })
                .collect()
        };

        info!(
            target = %target.kind,
            variant = %target.manifest,
            estimated_mib = estimate.total_mib,
            ceiling_mib,
            fits,
            "manifest resolved"
        );

        ManifestResolution {
            variant: target.manifest,
            manifest_path: manifest.path.clone(),
            requirement_count: manifest.len(),
            estimated_mib: estimate.total_mib,
            ceiling_mib,
            fits,
            oversized,
        }
    }
}
