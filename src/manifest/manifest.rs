use crate::manifest::error::{ManifestError, Result};
use crate::manifest::requirement::{normalize_name, Requirement};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// An ordered requirements file.
///
/// Order is preserved because pip installs in file order and the guides
/// rely on that for the heavyweight packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub path: PathBuf,
    pub requirements: Vec<Requirement>,
}

impl Manifest {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut requirements: Vec<Requirement> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let requirement = Requirement::parse(line).map_err(|reason| {
                ManifestError::InvalidRequirement {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason,
                }
            })?;

            let normalized = requirement.normalized_name();
            if !seen.insert(normalized.clone()) {
                warn!(
                    package = %requirement.name,
                    line = idx + 1,
                    "duplicate requirement, keeping the first occurrence"
                );
                continue;
            }
            requirements.push(requirement);
        }

        Ok(Self {
            path: path.to_path_buf(),
            requirements,
        })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ManifestError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::parse(&content, path)
    }

    /// Whether the manifest lists `name` (normalized comparison).
    pub fn contains(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        self.requirements
            .iter()
            .any(|r| r.normalized_name() == wanted)
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for requirement in &self.requirements {
            out.push_str(&requirement.to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# AETHER full stack
torch==2.1.0
transformers>=4.35.0
fastapi==0.104.1
uvicorn[standard]>=0.23.0

# frontend
streamlit>=1.28.0
";

    #[test]
    fn parses_file_in_order() {
        let manifest = Manifest::parse(SAMPLE, Path::new("requirements.txt")).unwrap();
        let names: Vec<&str> = manifest
            .requirements
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["torch", "transformers", "fastapi", "uvicorn", "streamlit"]
        );
    }

    #[test]
    fn reports_line_numbers_on_error() {
        let bad = "fastapi==0.104.1\nnot a requirement!\n";
        let err = Manifest::parse(bad, Path::new("requirements.txt")).unwrap_err();
        match err {
            ManifestError::InvalidRequirement { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_keeps_first() {
        let dup = "requests==2.31.0\nRequests>=2.0\n";
        let manifest = Manifest::parse(dup, Path::new("requirements.txt")).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.requirements[0].constraints[0].version, "2.31.0");
    }

    #[test]
    fn contains_normalizes() {
        let manifest =
            Manifest::parse("sentence-transformers>=2.2\n", Path::new("r.txt")).unwrap();
        assert!(manifest.contains("Sentence_Transformers"));
        assert!(!manifest.contains("torch"));
    }

    #[tokio::test]
    async fn load_missing_file_errors() {
        let err = Manifest::load(Path::new("/nonexistent/requirements.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }
}
