use crate::container::ContainerSpec;
use crate::manifest::{ImportScanner, Manifest, ManifestResolver};
use crate::platform::{artifacts, ArtifactStatus};
use crate::preflight::{ProjectChecker, ToolchainDetector};
use crate::release::error::Result;
use crate::release::stage::{ReleaseContext, ReleaseStage};
use crate::repo::{PublishOptions, RemotePublisher, RepoPreparer};
use crate::types::StageOutcome;
use async_trait::async_trait;
use std::path::PathBuf;

/// Tool availability plus the structural tree checks. Everything else
/// in the pipeline assumes a canonical work tree.
pub struct PreflightStage;

#[async_trait]
impl ReleaseStage for PreflightStage {
    fn name(&self) -> &'static str {
        "preflight"
    }

    async fn run(&self, ctx: &mut ReleaseContext) -> Result<StageOutcome> {
        let toolchain = ToolchainDetector::detect().await;

        let mut blockers = Vec::new();
        if ctx.plan.push && !toolchain.is_available("git") {
            blockers.push(
                "git is required to publish; install it from https://git-scm.com/downloads"
                    .to_string(),
            );
        }

        let report = ProjectChecker::new(ctx.layout.clone()).check_tree().await?;
        let error_count = report.errors().count();

        if error_count > 0 || !blockers.is_empty() {
            let mut lines = blockers;
            lines.extend(
                report
                    .errors()
                    .take(3)
                    .map(|f| format!("{}: {}", f.area, f.message)),
            );
            if error_count > 3 {
                lines.push(format!("and {} more", error_count - 3));
            }
            lines.push("run `aether-deploy check` for the full report".to_string());
            return Ok(StageOutcome::failed(self.name(), lines.join("; ")));
        }

        Ok(StageOutcome::completed(self.name(), "work tree and tooling look good"))
    }
}

/// Initialize version control if needed, maintain ignore rules, stage
/// and commit.
pub struct PrepareStage;

#[async_trait]
impl ReleaseStage for PrepareStage {
    fn name(&self) -> &'static str {
        "prepare repository"
    }

    async fn run(&self, ctx: &mut ReleaseContext) -> Result<StageOutcome> {
        if ctx.dry_run() {
            return Ok(StageOutcome::skipped(
                self.name(),
                format!(
                    "would stage the tree and commit \"{}\"",
                    ctx.plan.commit_message
                ),
            ));
        }

        let outcome = RepoPreparer::prepare(&ctx.layout.root, &ctx.plan.commit_message).await?;
        ctx.commit = outcome.commit.clone();

        let mut detail = String::new();
        if outcome.initialized {
            detail.push_str("initialized repository; ");
        }
        match &outcome.commit {
            Some(id) => {
                let short = id.get(..8).unwrap_or(id);
                detail.push_str(&format!(
                    "committed {short} on {} ({} files staged)",
                    outcome.branch, outcome.staged_files
                ));
            }
            None => detail.push_str("tree already matches HEAD, nothing to commit"),
        }
        Ok(StageOutcome::completed(self.name(), detail))
    }
}

/// Pick the manifest variant the target installs, check it against the
/// memory ceiling, and make sure the code's imports are all covered.
pub struct ManifestStage;

#[async_trait]
impl ReleaseStage for ManifestStage {
    fn name(&self) -> &'static str {
        "resolve manifest"
    }

    async fn run(&self, ctx: &mut ReleaseContext) -> Result<StageOutcome> {
        let resolver = ManifestResolver::new();
        let resolution = resolver.resolve(&ctx.layout, ctx.target).await?;

        if !resolution.fits {
            let mut lines = vec![format!(
                "estimated ~{} MiB exceeds the {} ceiling of {}",
                resolution.estimated_mib, ctx.target.ceiling, ctx.target.display_name
            )];
            lines.extend(
                resolution
                    .oversized
                    .iter()
                    .map(|o| format!("{} (~{} MiB): {}", o.name, o.estimated_mib, o.remediation)),
            );
            ctx.resolution = Some(resolution);
            return Ok(StageOutcome::failed(self.name(), lines.join("; ")));
        }

        let full = ctx.layout.full_manifest();
        if full.is_file() {
            if let Ok(manifest) = Manifest::load(&full).await {
                let coverage = ImportScanner::new().verify(&ctx.layout.root, &manifest)?;
                if !coverage.covered() {
                    let missing: Vec<String> = coverage
                        .missing
                        .iter()
                        .map(|m| m.distribution.clone())
                        .collect();
                    return Ok(StageOutcome::failed(
                        self.name(),
                        format!(
                            "imports not covered by requirements.txt: {}; add them and rerun",
                            missing.join(", ")
                        ),
                    ));
                }
            }
        }

        let detail = resolution.summary();
        ctx.resolution = Some(resolution);
        Ok(StageOutcome::completed(self.name(), detail))
    }
}

/// Write the target's platform files, plus container build files when
/// asked for.
pub struct ArtifactsStage;

#[async_trait]
impl ReleaseStage for ArtifactsStage {
    fn name(&self) -> &'static str {
        "render artifacts"
    }

    async fn run(&self, ctx: &mut ReleaseContext) -> Result<StageOutcome> {
        let rendered = artifacts::render_artifacts(ctx.target, ctx.ports)?;

        if ctx.dry_run() {
            let mut paths: Vec<PathBuf> =
                rendered.iter().map(|a| a.relative_path.clone()).collect();
            if ctx.plan.container {
                paths.push(PathBuf::from("Dockerfile"));
                paths.push(PathBuf::from(".dockerignore"));
            }
            let list = paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Ok(
                StageOutcome::skipped(self.name(), format!("would write {list}"))
                    .with_artifacts(paths),
            );
        }

        let written =
            artifacts::write_artifacts(&ctx.layout.root, &rendered, ctx.plan.force).await?;
        let mut paths: Vec<PathBuf> = written.iter().map(|(p, _)| p.clone()).collect();
        let count = |status: ArtifactStatus| written.iter().filter(|(_, s)| *s == status).count();
        let (created, updated, kept) = (
            count(ArtifactStatus::Created),
            count(ArtifactStatus::Updated),
            count(ArtifactStatus::SkippedExisting),
        );
        ctx.written = written;

        if ctx.plan.container {
            let spec = ContainerSpec::new(ctx.ports);
            let container_files = spec.write_artifacts(&ctx.layout.root).await?;
            paths.extend(
                container_files
                    .iter()
                    .map(|p| ctx.layout.relative(p).to_path_buf()),
            );
        }

        let mut detail = format!("{created} created, {updated} updated");
        if kept > 0 {
            detail.push_str(&format!(", {kept} kept (rerun with --force to replace)"));
        }
        if ctx.plan.container {
            detail.push_str(", container files written");
        }
        Ok(StageOutcome::completed(self.name(), detail).with_artifacts(paths))
    }
}

/// Validate the secret store against what the target requires. Values
/// stay out of the report; the paste block comes from `secrets render`.
pub struct SecretsStage;

#[async_trait]
impl ReleaseStage for SecretsStage {
    fn name(&self) -> &'static str {
        "configure secrets"
    }

    async fn run(&self, ctx: &mut ReleaseContext) -> Result<StageOutcome> {
        let problems = ctx.secrets.validate(ctx.target);
        let blocking: Vec<String> = problems
            .iter()
            .filter(|p| p.blocking)
            .map(|p| format!("{}: {} ({})", p.key, p.issue, p.remediation))
            .collect();

        if !blocking.is_empty() {
            return Ok(StageOutcome::failed(self.name(), blocking.join("; ")));
        }

        let advisories = problems.len();
        let mut detail = format!(
            "{} secret(s) ready for {}",
            ctx.secrets.len(),
            ctx.target.display_name
        );
        if advisories > 0 {
            detail.push_str(&format!(", {advisories} advisory note(s)"));
        }
        detail.push_str("; `aether-deploy secrets render` prints the dashboard block");
        Ok(StageOutcome::completed(self.name(), detail))
    }
}

/// Push to the remote. Only runs with `--push`; creating the repository
/// first is delegated to `gh` when requested.
pub struct PublishStage;

#[async_trait]
impl ReleaseStage for PublishStage {
    fn name(&self) -> &'static str {
        "publish"
    }

    async fn run(&self, ctx: &mut ReleaseContext) -> Result<StageOutcome> {
        if !ctx.plan.push {
            return Ok(StageOutcome::skipped(
                self.name(),
                "publishing is off by default; rerun with --push",
            ));
        }

        if ctx.dry_run() {
            let destination = ctx
                .plan
                .create_repo
                .clone()
                .or_else(|| ctx.plan.remote_url.clone())
                .unwrap_or_else(|| "the existing origin remote".to_string());
            return Ok(StageOutcome::skipped(
                self.name(),
                format!("would push to {destination}"),
            ));
        }

        let options = PublishOptions {
            remote_url: ctx.plan.remote_url.clone(),
            create_repo: ctx.plan.create_repo.clone(),
            private: ctx.plan.private_repo,
            ..Default::default()
        };
        let outcome = RemotePublisher::publish(&ctx.layout.root, &options).await?;

        let detail = if outcome.created_repo {
            format!(
                "created {} and pushed {}",
                outcome.remote_url, outcome.branch
            )
        } else {
            format!(
                "pushed {} to {} ({})",
                outcome.branch, outcome.remote_name, outcome.remote_url
            )
        };
        Ok(StageOutcome::completed(self.name(), detail))
    }
}
