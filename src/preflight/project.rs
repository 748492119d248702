use crate::manifest::{ImportScanner, ManifestError, ManifestResolver};
use crate::preflight::error::Result;
use crate::repo::IGNORE_RULES;
use crate::secrets::SecretStore;
use crate::types::{ManifestVariant, ProjectLayout, TargetDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found in the work tree, with the fix the deployment
/// guides prescribe for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFinding {
    pub severity: Severity,
    pub area: String,
    pub message: String,
    pub remediation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckReport {
    pub findings: Vec<CheckFinding>,
}

impl CheckReport {
    pub fn error(&mut self, area: &str, message: impl Into<String>, remediation: impl Into<String>) {
        self.findings.push(CheckFinding {
            severity: Severity::Error,
            area: area.to_string(),
            message: message.into(),
            remediation: remediation.into(),
        });
    }

    pub fn warning(
        &mut self,
        area: &str,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) {
        self.findings.push(CheckFinding {
            severity: Severity::Warning,
            area: area.to_string(),
            message: message.into(),
            remediation: remediation.into(),
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &CheckFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CheckFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    /// A report passes when nothing blocking was found.
    pub fn passed(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Document-level checks against one deployment target: required files,
/// manifest fit, import coverage, secrets, ignore rules.
pub struct ProjectChecker {
    layout: ProjectLayout,
}

impl ProjectChecker {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub async fn check(
        &self,
        target: &TargetDescriptor,
        secrets: &SecretStore,
    ) -> Result<CheckReport> {
        let mut report = self.check_tree().await?;

        self.check_manifest(&mut report, target).await?;
        self.check_imports(&mut report).await?;
        self.check_secrets(&mut report, target, secrets);

        debug!(
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "project check finished"
        );
        Ok(report)
    }

    /// The structural subset: required files and ignore rules. Used on
    /// its own where manifest and secrets get their own dedicated pass.
    pub async fn check_tree(&self) -> Result<CheckReport> {
        let mut report = CheckReport::default();
        self.check_required_files(&mut report);
        self.check_ignore_rules(&mut report).await?;
        Ok(report)
    }

    fn check_required_files(&self, report: &mut CheckReport) {
        for (label, path) in self.layout.required_files() {
            if !path.is_file() {
                let relative = self.layout.relative(&path).display();
                report.error(
                    "files",
                    format!("{label} not found: {relative}"),
                    format!("create {relative}; the platform configs reference it by name"),
                );
            }
        }
    }

    async fn check_manifest(
        &self,
        report: &mut CheckReport,
        target: &TargetDescriptor,
    ) -> Result<()> {
        let resolver = ManifestResolver::new();
        match resolver.resolve(&self.layout, target).await {
            Ok(resolution) => {
                if !resolution.fits {
                    let remediation = match resolution.variant {
                        ManifestVariant::Full => {
                            "deploy the full stack to Hugging Face Spaces, or use a target \
                             that installs the lightweight manifest"
                        }
                        ManifestVariant::Lightweight => {
                            "trim requirements-streamlit.txt or pick a platform with a \
                             bigger memory ceiling"
                        }
                    };
                    report.error(
                        "manifest",
                        format!(
                            "estimated install footprint ~{} MiB exceeds the {} ceiling of {}",
                            resolution.estimated_mib, target.ceiling, target.display_name
                        ),
                        remediation,
                    );
                    for dep in &resolution.oversized {
                        report.error(
                            "manifest",
                            format!("{} alone needs ~{} MiB", dep.name, dep.estimated_mib),
                            dep.remediation.clone(),
                        );
                    }
                }
            }
            // Missing manifest files already show up in the files area.
            Err(ManifestError::NotFound { .. }) => {}
            Err(ManifestError::InvalidRequirement { path, line, reason }) => {
                report.error(
                    "manifest",
                    format!("{}:{line}: {reason}", self.layout.relative(&path).display()),
                    "fix the requirement line; pip will reject it during the platform build",
                );
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Imports are always verified against the full manifest; it is the
    /// document that describes everything the project can run.
    async fn check_imports(&self, report: &mut CheckReport) -> Result<()> {
        let path = self.layout.full_manifest();
        let manifest = match crate::manifest::Manifest::load(&path).await {
            Ok(manifest) => manifest,
            Err(ManifestError::NotFound { .. }) => return Ok(()),
            Err(ManifestError::InvalidRequirement { .. }) => {
                debug!("skipping import coverage, full manifest does not parse");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let coverage = ImportScanner::new().verify(&self.layout.root, &manifest)?;
        for missing in &coverage.missing {
            let first = missing
                .files
                .first()
                .map(|p| self.layout.relative(p).display().to_string())
                .unwrap_or_default();
            let where_used = if missing.files.len() > 1 {
                format!("{first} (+{} more)", missing.files.len() - 1)
            } else {
                first
            };
            report.error(
                "manifest",
                format!(
                    "`{}` is imported by {} but missing from requirements.txt",
                    missing.module, where_used
                ),
                format!("add {} to requirements.txt and redeploy", missing.distribution),
            );
        }
        Ok(())
    }

    fn check_secrets(
        &self,
        report: &mut CheckReport,
        target: &TargetDescriptor,
        secrets: &SecretStore,
    ) {
        for problem in secrets.validate(target) {
            let finding = CheckFinding {
                severity: if problem.blocking {
                    Severity::Error
                } else {
                    Severity::Warning
                },
                area: "secrets".to_string(),
                message: format!("{}: {}", problem.key, problem.issue),
                remediation: problem.remediation,
            };
            report.findings.push(finding);
        }
    }

    async fn check_ignore_rules(&self, report: &mut CheckReport) -> Result<()> {
        let path = self.layout.gitignore();
        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let lines: HashSet<&str> = existing.lines().map(str::trim).collect();
        let missing: Vec<&str> = IGNORE_RULES
            .iter()
            .copied()
            .filter(|rule| !lines.contains(rule))
            .collect();

        if !missing.is_empty() {
            report.error(
                "ignore rules",
                format!(".gitignore does not cover: {}", missing.join(", ")),
                "run `aether-deploy init` to extend .gitignore before anything is committed",
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::registry;
    use crate::types::PlatformKind;
    use std::path::Path;

    async fn scaffold(root: &Path) {
        for dir in ["api", "web", "core", ".streamlit"] {
            tokio::fs::create_dir_all(root.join(dir)).await.unwrap();
        }
        let files: &[(&str, &str)] = &[
            ("run.py", "import subprocess\n"),
            ("streamlit_app.py", "import streamlit as st\n"),
            ("api/main.py", "from fastapi import FastAPI\n"),
            ("web/app.py", "import streamlit as st\nimport requests\n"),
            ("core/aether_engine.py", "import os\n"),
            ("requirements.txt", "fastapi\nuvicorn\nstreamlit\nrequests\n"),
            ("requirements-streamlit.txt", "streamlit\nrequests\n"),
            ("packages.txt", "build-essential\n"),
            (".streamlit/config.toml", "[server]\nheadless = true\n"),
        ];
        for (path, content) in files {
            tokio::fs::write(root.join(path), content).await.unwrap();
        }
        let gitignore = IGNORE_RULES.join("\n") + "\n";
        tokio::fs::write(root.join(".gitignore"), gitignore)
            .await
            .unwrap();
    }

    fn secrets_with_key(root: &Path) -> SecretStore {
        let mut store = SecretStore::empty(root.join("secrets.toml"));
        store.set("OPENAI_API_KEY", "sk-test");
        store
    }

    #[tokio::test]
    async fn complete_project_passes() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path()).await;

        let checker = ProjectChecker::new(ProjectLayout::new(dir.path()));
        let target = registry::descriptor(PlatformKind::Replit);
        let report = checker
            .check(target, &secrets_with_key(dir.path()))
            .await
            .unwrap();

        assert!(report.passed(), "unexpected findings: {:?}", report.findings);
    }

    #[tokio::test]
    async fn missing_required_file_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path()).await;
        tokio::fs::remove_file(dir.path().join("packages.txt"))
            .await
            .unwrap();

        let checker = ProjectChecker::new(ProjectLayout::new(dir.path()));
        let target = registry::descriptor(PlatformKind::Replit);
        let report = checker
            .check(target, &secrets_with_key(dir.path()))
            .await
            .unwrap();

        assert!(!report.passed());
        assert!(report
            .errors()
            .any(|f| f.area == "files" && f.message.contains("system package list")));
    }

    #[tokio::test]
    async fn dropped_ignore_rule_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path()).await;
        let trimmed: Vec<&str> = IGNORE_RULES
            .iter()
            .copied()
            .filter(|r| *r != "secrets.toml")
            .collect();
        tokio::fs::write(dir.path().join(".gitignore"), trimmed.join("\n"))
            .await
            .unwrap();

        let checker = ProjectChecker::new(ProjectLayout::new(dir.path()));
        let target = registry::descriptor(PlatformKind::Replit);
        let report = checker
            .check(target, &secrets_with_key(dir.path()))
            .await
            .unwrap();

        assert!(report
            .errors()
            .any(|f| f.area == "ignore rules" && f.message.contains("secrets.toml")));
    }

    #[tokio::test]
    async fn uncovered_import_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path()).await;
        tokio::fs::write(dir.path().join("api/extra.py"), "import chromadb\n")
            .await
            .unwrap();

        let checker = ProjectChecker::new(ProjectLayout::new(dir.path()));
        let target = registry::descriptor(PlatformKind::Replit);
        let report = checker
            .check(target, &secrets_with_key(dir.path()))
            .await
            .unwrap();

        assert!(report.errors().any(|f| f.message.contains("chromadb")
            && f.remediation.contains("add chromadb to requirements.txt")));
    }

    #[tokio::test]
    async fn missing_secret_blocks_and_carries_remediation() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path()).await;

        let checker = ProjectChecker::new(ProjectLayout::new(dir.path()));
        let target = registry::descriptor(PlatformKind::Replit);
        let empty = SecretStore::empty(dir.path().join("secrets.toml"));
        let report = checker.check(target, &empty).await.unwrap();

        assert!(report
            .errors()
            .any(|f| f.area == "secrets" && f.message.contains("OPENAI_API_KEY")));
    }
}
