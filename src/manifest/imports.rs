use crate::manifest::error::{ManifestError, Result};
use crate::manifest::manifest::Manifest;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(from|import)\s+([A-Za-z_][A-Za-z0-9_.,\s]*)").unwrap());

/// Standard library roots that never belong in a manifest. Covers what
/// actually appears in Python application code, not the whole library.
static STDLIB: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abc", "argparse", "array", "asyncio", "base64", "bisect", "builtins", "calendar",
        "collections", "concurrent", "configparser", "contextlib", "copy", "csv", "ctypes",
        "dataclasses", "datetime", "decimal", "difflib", "email", "enum", "errno", "functools",
        "gc", "getpass", "glob", "gzip", "hashlib", "heapq", "hmac", "html", "http", "importlib",
        "inspect", "io", "itertools", "json", "logging", "math", "mimetypes", "multiprocessing",
        "numbers", "operator", "os", "pathlib", "pickle", "platform", "pprint", "queue", "random",
        "re", "secrets", "select", "shlex", "shutil", "signal", "site", "socket", "sqlite3",
        "ssl", "stat", "statistics", "string", "struct", "subprocess", "sys", "sysconfig",
        "tempfile", "textwrap", "threading", "time", "tomllib", "traceback", "types", "typing",
        "unicodedata", "unittest", "urllib", "uuid", "warnings", "weakref", "webbrowser", "xml",
        "zipfile", "zlib", "zoneinfo",
    ]
    .into_iter()
    .collect()
});

/// Import module names whose installable distribution is spelled
/// differently.
static DISTRIBUTION_MAP: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("bs4", "beautifulsoup4"),
        ("cv2", "opencv-python"),
        ("dateutil", "python-dateutil"),
        ("dotenv", "python-dotenv"),
        ("fitz", "PyMuPDF"),
        ("jose", "python-jose"),
        ("multipart", "python-multipart"),
        ("PIL", "Pillow"),
        ("sklearn", "scikit-learn"),
        ("yaml", "PyYAML"),
    ]
    .into_iter()
    .collect()
});

/// One third-party module found in the sources, with the files using it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedImport {
    pub module: String,
    pub distribution: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportScan {
    pub files_scanned: usize,
    pub imports: Vec<ScannedImport>,
}

/// An import the active manifest does not cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingImport {
    pub module: String,
    pub distribution: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub files_scanned: usize,
    pub imports_found: usize,
    pub missing: Vec<MissingImport>,
}

impl CoverageReport {
    pub fn covered(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Walks the Python sources and extracts third-party imports so the
/// manifest can be checked against what the code actually uses.
#[derive(Debug, Default)]
pub struct ImportScanner;

impl ImportScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan(&self, root: &Path) -> Result<ImportScan> {
        let first_party = first_party_roots(root)?;
        let mut by_module: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut files_scanned = 0usize;

        for entry in WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e))
        {
            let entry = entry.map_err(|e| ManifestError::ScanFailed {
                path: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }

            files_scanned += 1;
            let content = std::fs::read_to_string(entry.path()).map_err(|source| {
                ManifestError::ScanFailed {
                    path: entry.path().to_path_buf(),
                    source,
                }
            })?;

            for module in imports_in(&content) {
                if STDLIB.contains(module.as_str()) || first_party.contains(&module) {
                    continue;
                }
                let files = by_module.entry(module).or_default();
                let path = entry.path().to_path_buf();
                if !files.contains(&path) {
                    files.push(path);
                }
            }
        }

        debug!(files_scanned, modules = by_module.len(), "import scan complete");

        let imports = by_module
            .into_iter()
            .map(|(module, files)| ScannedImport {
                distribution: distribution_for(&module),
                module,
                files,
            })
            .collect();

        Ok(ImportScan {
            files_scanned,
            imports,
        })
    }

    /// Check that every scanned import appears in the manifest.
    pub fn verify(&self, root: &Path, manifest: &Manifest) -> Result<CoverageReport> {
        let scan = self.scan(root)?;
        let missing = scan
            .imports
            .iter()
            .filter(|i| !manifest.contains(&i.distribution))
            .map(|i| MissingImport {
                module: i.module.clone(),
                distribution: i.distribution.clone(),
                files: i.files.clone(),
            })
            .collect();

        Ok(CoverageReport {
            files_scanned: scan.files_scanned,
            imports_found: scan.imports.len(),
            missing,
        })
    }
}

/// Top-level module names importable from the project root itself.
fn first_party_roots(root: &Path) -> Result<HashSet<String>> {
    let mut roots = HashSet::new();
    let entries = std::fs::read_dir(root).map_err(|source| ManifestError::ScanFailed {
        path: root.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if path.is_dir() && !name.starts_with('.') {
            roots.insert(name);
        } else if let Some(stem) = name.strip_suffix(".py") {
            roots.insert(stem.to_string());
        }
    }
    Ok(roots)
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') && entry.depth() > 0
        || name == "__pycache__"
        || name == "venv"
        || name == "node_modules"
}

/// Extract top-level module names imported by a source file. Relative
/// imports are first-party by definition and skipped.
fn imports_in(content: &str) -> Vec<String> {
    let mut modules = Vec::new();
    for line in content.lines() {
        let Some(caps) = IMPORT_RE.captures(line) else {
            continue;
        };
        let keyword = &caps[1];
        let rest = caps[2].trim();

        if keyword == "from" {
            if let Some(module) = rest.split_whitespace().next() {
                if let Some(root) = module_root(module) {
                    modules.push(root);
                }
            }
        } else {
            for part in rest.split(',') {
                let token = part.split_whitespace().next().unwrap_or("");
                if let Some(root) = module_root(token) {
                    modules.push(root);
                }
            }
        }
    }
    modules
}

fn module_root(token: &str) -> Option<String> {
    if token.is_empty() || token.starts_with('.') {
        return None;
    }
    let root = token.split('.').next()?;
    if root.is_empty() {
        None
    } else {
        Some(root.to_string())
    }
}

fn distribution_for(module: &str) -> String {
    DISTRIBUTION_MAP
        .get(module)
        .map_or_else(|| module.replace('_', "-"), |d| d.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_from_imports() {
        let src = "import torch\nfrom fastapi import FastAPI\nimport os, requests\n";
        let mut modules = imports_in(src);
        modules.sort();
        assert_eq!(modules, vec!["fastapi", "os", "requests", "torch"]);
    }

    #[test]
    fn skips_relative_imports() {
        let src = "from .engine import AetherEngine\nfrom ..common import util\n";
        assert!(imports_in(src).is_empty());
    }

    #[test]
    fn indented_imports_count() {
        // run.py imports requests inside a method body
        let src = "def wait(self):\n    import requests\n    return requests\n";
        assert_eq!(imports_in(src), vec!["requests"]);
    }

    #[test]
    fn maps_renamed_distributions() {
        assert_eq!(distribution_for("yaml"), "PyYAML");
        assert_eq!(distribution_for("dotenv"), "python-dotenv");
        assert_eq!(distribution_for("sentence_transformers"), "sentence-transformers");
        assert_eq!(distribution_for("fastapi"), "fastapi");
    }

    #[test]
    fn scan_separates_stdlib_and_first_party() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("core")).unwrap();
        std::fs::write(
            dir.path().join("run.py"),
            "import os\nimport requests\nfrom core.engine import Engine\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("core").join("engine.py"), "import torch\n").unwrap();

        let scan = ImportScanner::new().scan(dir.path()).unwrap();
        let modules: Vec<&str> = scan.imports.iter().map(|i| i.module.as_str()).collect();

        assert_eq!(scan.files_scanned, 2);
        assert_eq!(modules, vec!["requests", "torch"]);
    }

    #[test]
    fn verify_reports_uncovered_imports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "import streamlit\nimport openai\n").unwrap();

        let manifest =
            Manifest::parse("streamlit>=1.28\n", Path::new("requirements-streamlit.txt")).unwrap();
        let report = ImportScanner::new().verify(dir.path(), &manifest).unwrap();

        assert!(!report.covered());
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].distribution, "openai");
    }
}
