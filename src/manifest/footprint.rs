use crate::manifest::manifest::Manifest;
use crate::manifest::requirement::normalize_name;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Installed size the Python runtime itself needs before any package.
const BASE_RUNTIME_MIB: u64 = 150;

/// Assumed size for packages the catalog does not know.
const DEFAULT_PACKAGE_MIB: u64 = 10;

/// Approximate installed sizes (MiB) for the packages that dominate the
/// footprint, with API-based alternatives where one exists. The numbers
/// only need to answer "does this fit a free tier", not be exact.
static CATALOG: Lazy<HashMap<&'static str, PackageFootprint>> = Lazy::new(|| {
    let mut map = HashMap::new();
    let mut add = |name: &'static str, mib: u64, alternative: Option<&'static str>| {
        map.insert(name, PackageFootprint { mib, alternative });
    };

    add("torch", 2500, Some("openai"));
    add("transformers", 450, Some("openai"));
    add("sentence-transformers", 500, Some("openai"));
    add("accelerate", 30, Some("openai"));
    add("peft", 60, Some("openai"));
    add("bitsandbytes", 150, Some("openai"));
    add("chromadb", 250, None);
    add("langchain", 120, None);
    add("scipy", 110, None);
    add("pandas", 120, None);
    add("numpy", 90, None);
    add("streamlit", 80, None);
    add("fastapi", 15, None);
    add("uvicorn", 10, None);
    add("pydantic", 15, None);
    add("requests", 5, None);
    add("httpx", 10, None);
    add("aiohttp", 20, None);
    add("openai", 10, None);
    add("python-dotenv", 1, None);

    map
});

#[derive(Debug, Clone, Copy)]
struct PackageFootprint {
    mib: u64,
    alternative: Option<&'static str>,
}

/// Size estimate for one listed package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageEstimate {
    pub name: String,
    pub estimated_mib: u64,
    /// Lighter replacement that keeps the feature through a hosted API.
    pub alternative: Option<String>,
}

/// Estimated install footprint of a whole manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintEstimate {
    pub total_mib: u64,
    pub packages: Vec<PackageEstimate>,
}

impl FootprintEstimate {
    /// Packages at or above `threshold_mib`, largest first.
    pub fn heaviest(&self, threshold_mib: u64) -> Vec<&PackageEstimate> {
        let mut heavy: Vec<&PackageEstimate> = self
            .packages
            .iter()
            .filter(|p| p.estimated_mib >= threshold_mib)
            .collect();
        heavy.sort_by(|a, b| b.estimated_mib.cmp(&a.estimated_mib));
        heavy
    }
}

/// Catalog-driven footprint estimator.
#[derive(Debug, Default)]
pub struct FootprintCatalog;

impl FootprintCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, manifest: &Manifest) -> FootprintEstimate {
        let mut packages = Vec::with_capacity(manifest.len());
        let mut total = BASE_RUNTIME_MIB;

        for requirement in &manifest.requirements {
            let normalized = requirement.normalized_name();
            let entry = CATALOG.get(normalized.as_str());
            let mib = entry.map_or(DEFAULT_PACKAGE_MIB, |e| e.mib);
            total += mib;
            packages.push(PackageEstimate {
                name: requirement.name.clone(),
                estimated_mib: mib,
                alternative: entry.and_then(|e| e.alternative.map(str::to_string)),
            });
        }

        FootprintEstimate {
            total_mib: total,
            packages,
        }
    }

    pub fn alternative_for(&self, name: &str) -> Option<&'static str> {
        CATALOG
            .get(normalize_name(name).as_str())
            .and_then(|e| e.alternative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn full_stack_dwarfs_free_tier() {
        let manifest = Manifest::parse(
            "torch==2.1.0\ntransformers>=4.35.0\nfastapi\nuvicorn\n",
            Path::new("requirements.txt"),
        )
        .unwrap();
        let estimate = FootprintCatalog::new().estimate(&manifest);
        assert!(estimate.total_mib > 2500);
    }

    #[test]
    fn lightweight_stack_fits_free_tier() {
        let manifest = Manifest::parse(
            "streamlit>=1.28.0\nrequests\nopenai\npython-dotenv\n",
            Path::new("requirements-streamlit.txt"),
        )
        .unwrap();
        let estimate = FootprintCatalog::new().estimate(&manifest);
        assert!(estimate.total_mib < 512, "got {} MiB", estimate.total_mib);
    }

    #[test]
    fn heaviest_sorts_descending() {
        let manifest = Manifest::parse(
            "torch\nstreamlit\ntransformers\n",
            Path::new("requirements.txt"),
        )
        .unwrap();
        let estimate = FootprintCatalog::new().estimate(&manifest);
        let heavy = estimate.heaviest(100);
        assert_eq!(heavy[0].name, "torch");
        assert_eq!(heavy[1].name, "transformers");
    }

    #[test]
    fn model_stack_has_api_alternative() {
        let catalog = FootprintCatalog::new();
        assert_eq!(catalog.alternative_for("torch"), Some("openai"));
        assert_eq!(catalog.alternative_for("Sentence_Transformers"), Some("openai"));
        assert_eq!(catalog.alternative_for("streamlit"), None);
    }
}
