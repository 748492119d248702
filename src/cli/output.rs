use crate::container::{ProbeOutcome, ProbeStatus};
use crate::manifest::{CoverageReport, ManifestResolution};
use crate::preflight::{CheckReport, EnvironmentInfo, ToolStatus, ToolchainReport};
use crate::repo::{PrepareOutcome, PublishOutcome};
use crate::secrets::SecretStore;
use crate::types::{ReleaseReport, StageStatus, TargetDescriptor};

/// Print the full readiness report in human-readable form.
pub fn print_check_report(
    target: &TargetDescriptor,
    environment: &EnvironmentInfo,
    toolchain: &ToolchainReport,
    report: &CheckReport,
) {
    println!("🔍 Deployment Check: {}", target.display_name);
    println!("========================================");
    println!();

    println!(
        "🖥️  Environment: {} ({} {})",
        environment.hostname, environment.os, environment.arch
    );
    println!();

    println!("🧰 Tooling:");
    for tool in &toolchain.tools {
        match &tool.status {
            ToolStatus::Available { version } => {
                println!("  ✅ {}: {}", tool.name, version);
            }
            ToolStatus::Missing => {
                println!("  ❌ {}: missing, install from {}", tool.name, tool.install_hint);
            }
        }
    }
    println!();

    let errors: Vec<_> = report.errors().collect();
    let warnings: Vec<_> = report.warnings().collect();

    if !errors.is_empty() {
        println!("❌ Blocking problems ({}):", errors.len());
        for finding in &errors {
            println!("  • [{}] {}", finding.area, finding.message);
            println!("    fix: {}", finding.remediation);
        }
        println!();
    }

    if !warnings.is_empty() {
        println!("⚠️  Advisories ({}):", warnings.len());
        for finding in &warnings {
            println!("  • [{}] {}", finding.area, finding.message);
            println!("    fix: {}", finding.remediation);
        }
        println!();
    }

    if errors.is_empty() && warnings.is_empty() {
        println!("✅ Ready to deploy to {}", target.display_name);
    } else if errors.is_empty() {
        println!(
            "✅ Ready to deploy to {} ({} advisory note(s) above)",
            target.display_name,
            warnings.len()
        );
    } else {
        println!("❌ Fix the blocking problems above, then run `aether-deploy check` again");
    }
}

/// List every supported target with the facts an operator picks by.
pub fn print_targets(targets: &[TargetDescriptor]) {
    println!("🎯 Deployment Targets ({}):", targets.len());
    println!("========================================");
    println!();

    for target in targets {
        println!("• {} (--target {})", target.display_name, target.kind);
        println!("    memory ceiling: {}", target.ceiling);
        println!("    installs from:  {}", target.manifest_file());
        println!("    entry file:     {}", target.entry_file);
        if let Some(build) = &target.build_command {
            println!("    build command:  {}", build);
        }
        println!("    start command:  {}", target.start_command);
        if !target.required_secrets.is_empty() {
            println!("    secrets:        {}", target.required_secrets.join(", "));
        }
        println!("    dashboard:      {}", target.dashboard_url);
        println!();
    }
}

/// Print the manifest resolution for one target.
pub fn print_resolution(target: &TargetDescriptor, resolution: &ManifestResolution) {
    println!("📦 Manifest for {}", target.display_name);
    println!("========================================");
    println!();
    println!("  file:      {}", resolution.manifest_path.display());
    println!("  variant:   {}", resolution.variant);
    println!("  packages:  {}", resolution.requirement_count);
    println!(
        "  estimated: ~{} MiB (ceiling {} MiB)",
        resolution.estimated_mib, resolution.ceiling_mib
    );
    println!();

    if resolution.fits {
        println!("✅ Fits the {} ceiling", target.ceiling);
    } else {
        println!("❌ Exceeds the {} ceiling", target.ceiling);
        for dep in &resolution.oversized {
            println!("  • {} (~{} MiB): {}", dep.name, dep.estimated_mib, dep.remediation);
        }
    }
}

/// Print the import coverage result that follows a manifest resolution.
pub fn print_coverage(coverage: &CoverageReport) {
    println!();
    println!(
        "🔎 Import coverage: {} file(s) scanned, {} third-party import(s)",
        coverage.files_scanned, coverage.imports_found
    );
    if coverage.covered() {
        println!("✅ Every import is listed in requirements.txt");
    } else {
        println!("❌ Missing from requirements.txt:");
        for missing in &coverage.missing {
            let first = missing
                .files
                .first()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!(
                "  • {} (imported by {}), add \"{}\"",
                missing.module, first, missing.distribution
            );
        }
    }
}

/// Stage-by-stage release summary.
pub fn print_release_report(report: &ReleaseReport) {
    let short_id = report
        .metadata
        .release_id
        .get(..8)
        .unwrap_or(&report.metadata.release_id);

    println!("🚀 Release {} for {}", short_id, report.target);
    if report.dry_run {
        println!("   (dry run, nothing was written or pushed)");
    }
    println!("========================================");
    println!();

    for outcome in &report.outcomes {
        let icon = match outcome.status {
            StageStatus::Completed => "✅",
            StageStatus::Skipped => "⏭️ ",
            StageStatus::Failed => "❌",
        };
        println!("{} {} ({} ms)", icon, outcome.stage, outcome.duration.as_millis());
        if let Some(detail) = &outcome.detail {
            println!("     {}", detail);
        }
        for artifact in &outcome.artifacts {
            println!("     • {}", artifact.display());
        }
    }
    println!();

    if report.success {
        println!("🎉 Release completed");
    } else if let Some(failed) = report.failed_stage() {
        println!("❌ Release halted at \"{}\"", failed.stage);
    }
}

/// Summary of an `init` run.
pub fn print_prepare_outcome(outcome: &PrepareOutcome) {
    println!("📁 Repository prepared");
    if outcome.initialized {
        println!("  • initialized a new git repository");
    }
    if outcome.ignore_updated {
        println!("  • extended .gitignore with secret and cache rules");
    }
    match &outcome.commit {
        Some(id) => println!(
            "  • committed {} on {} ({} file(s) staged)",
            id.get(..8).unwrap_or(id),
            outcome.branch,
            outcome.staged_files
        ),
        None => println!("  • tree already matches HEAD, nothing to commit"),
    }
}

/// Summary of a `publish` run.
pub fn print_publish_outcome(outcome: &PublishOutcome) {
    if outcome.created_repo {
        println!("🐙 Created {}", outcome.remote_url);
    }
    println!(
        "⬆️  Pushed {} to {} ({})",
        outcome.branch, outcome.remote_name, outcome.remote_url
    );
}

/// One-line health probe verdict.
pub fn print_probe_outcome(outcome: &ProbeOutcome) {
    match &outcome.last {
        ProbeStatus::Healthy { latency_ms } => {
            println!(
                "✅ {} is healthy ({} ms, {} attempt(s))",
                outcome.url, latency_ms, outcome.attempts
            );
        }
        ProbeStatus::Unhealthy { status } => {
            println!(
                "❌ {} answered HTTP {} after {} attempt(s) over {}s",
                outcome.url, status, outcome.attempts, outcome.elapsed_secs
            );
        }
        ProbeStatus::Unreachable { error } => {
            println!(
                "❌ {} unreachable after {} attempt(s) over {}s: {}",
                outcome.url, outcome.attempts, outcome.elapsed_secs, error
            );
        }
    }
}

/// Key listing with every value masked.
pub fn print_secrets(store: &SecretStore) {
    if store.is_empty() {
        println!("🔐 No secrets stored yet");
        println!("   Set one with: aether-deploy secrets set OPENAI_API_KEY sk-...");
        return;
    }

    println!("🔐 Secrets in {} ({}):", store.path().display(), store.len());
    for (key, masked) in store.redacted() {
        println!("  • {} = {}", key, masked);
    }
}
