use crate::cli::options::{AetherDeployCli, Commands, OutputFormat, SecretsAction};
use crate::cli::{output, wizard};
use crate::container::{ContainerSpec, HealthProbe, ImageBuilder};
use crate::launch::{LaunchMode, Launcher};
use crate::manifest::{ImportScanner, Manifest, ManifestResolver};
use crate::platform::registry;
use crate::preflight::{EnvironmentInfo, ProjectChecker, ToolchainDetector};
use crate::release::ReleasePipeline;
use crate::repo::{PublishOptions, RemotePublisher, RepoPreparer};
use crate::secrets::SecretStore;
use crate::types::{
    PlatformKind, ProjectLayout, ReleaseMetadata, ReleasePlan, ReleaseReport, ServicePorts,
};
use anyhow::bail;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Dispatch a parsed command line.
pub async fn run(cli: AetherDeployCli) -> anyhow::Result<()> {
    let AetherDeployCli {
        command,
        project_root,
        secrets_file,
        ..
    } = cli;
    let layout = ProjectLayout::new(project_root);

    match command {
        Commands::Check { target, format } => check(layout, secrets_file, target, format).await,
        Commands::Targets { format } => targets(format),
        Commands::Init { message } => init(layout, &message).await,
        Commands::Publish {
            repo,
            remote_url,
            private,
        } => publish(layout, repo, remote_url, private).await,
        Commands::Manifest {
            target,
            verify_imports,
        } => manifest(layout, target, verify_imports).await,
        Commands::Secrets { action } => secrets(secrets_file, action).await,
        Commands::Container { build, image } => container(layout, build, image).await,
        Commands::Probe { url, timeout } => probe(url, timeout).await,
        Commands::Launch {
            mode,
            api_port,
            web_port,
            no_browser,
        } => launch(layout, mode, api_port, web_port, no_browser).await,
        Commands::Release {
            target,
            message,
            push,
            repo,
            remote_url,
            private,
            container,
            force,
            dry_run,
            format,
        } => {
            let kind = wizard::resolve_target(target)?;
            let plan = ReleasePlan {
                metadata: ReleaseMetadata::generate(),
                target: kind,
                commit_message: message,
                push,
                create_repo: repo,
                remote_url,
                private_repo: private,
                container,
                force,
                secrets_file,
                dry_run,
            };
            release(layout, plan, format).await
        }
    }
}

async fn load_store(secrets_file: &Option<PathBuf>) -> anyhow::Result<SecretStore> {
    let path = match secrets_file {
        Some(path) => path.clone(),
        None => SecretStore::default_path()?,
    };
    Ok(SecretStore::load_or_empty(&path).await?)
}

async fn check(
    layout: ProjectLayout,
    secrets_file: Option<PathBuf>,
    target: Option<PlatformKind>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let kind = wizard::resolve_target(target)?;
    let target = registry::descriptor(kind);
    let secrets = load_store(&secrets_file).await?;

    let environment = EnvironmentInfo::detect();
    let toolchain = ToolchainDetector::detect().await;
    let report = ProjectChecker::new(layout).check(target, &secrets).await?;

    match format {
        OutputFormat::Text => output::print_check_report(target, &environment, &toolchain, &report),
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "target": kind,
                "environment": environment,
                "toolchain": toolchain,
                "findings": report.findings,
                "passed": report.passed(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    if !report.passed() {
        bail!("deployment check found blocking problems");
    }
    Ok(())
}

fn targets(format: OutputFormat) -> anyhow::Result<()> {
    let all = registry::registry();
    match format {
        OutputFormat::Text => output::print_targets(all),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(all)?),
    }
    Ok(())
}

async fn init(layout: ProjectLayout, message: &str) -> anyhow::Result<()> {
    let outcome = RepoPreparer::prepare(&layout.root, message).await?;
    output::print_prepare_outcome(&outcome);
    Ok(())
}

async fn publish(
    layout: ProjectLayout,
    repo: Option<String>,
    remote_url: Option<String>,
    private: bool,
) -> anyhow::Result<()> {
    let options = PublishOptions {
        remote_url,
        create_repo: repo,
        private,
        ..Default::default()
    };
    let outcome = RemotePublisher::publish(&layout.root, &options).await?;
    output::print_publish_outcome(&outcome);
    Ok(())
}

async fn manifest(
    layout: ProjectLayout,
    target: Option<PlatformKind>,
    verify_imports: bool,
) -> anyhow::Result<()> {
    let kind = wizard::resolve_target(target)?;
    let target = registry::descriptor(kind);

    let resolution = ManifestResolver::new().resolve(&layout, target).await?;
    output::print_resolution(target, &resolution);

    let mut covered = true;
    if verify_imports {
        let full = Manifest::load(&layout.full_manifest()).await?;
        let coverage = ImportScanner::new().verify(&layout.root, &full)?;
        covered = coverage.covered();
        output::print_coverage(&coverage);
    }

    if !resolution.fits {
        bail!("manifest exceeds the {} ceiling", target.ceiling);
    }
    if !covered {
        bail!("requirements.txt does not cover every import");
    }
    Ok(())
}

async fn secrets(secrets_file: Option<PathBuf>, action: SecretsAction) -> anyhow::Result<()> {
    match action {
        SecretsAction::Show => {
            let store = load_store(&secrets_file).await?;
            output::print_secrets(&store);
        }
        SecretsAction::Set { key, value } => {
            let mut store = load_store(&secrets_file).await?;
            store.set(key.clone(), value);
            store.save().await?;
            println!("🔐 Stored {} in {}", key, store.path().display());
        }
        SecretsAction::Render { target } => {
            let kind = wizard::resolve_target(target)?;
            let target = registry::descriptor(kind);
            let store = load_store(&secrets_file).await?;
            print!("{}", store.render_for(target));
        }
        SecretsAction::Path => {
            let path = match &secrets_file {
                Some(path) => path.clone(),
                None => SecretStore::default_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn container(layout: ProjectLayout, build: bool, image: String) -> anyhow::Result<()> {
    let spec = ContainerSpec::new(ServicePorts::default());
    let written = spec.write_artifacts(&layout.root).await?;

    println!("🐳 Container build files:");
    for path in &written {
        println!("  • {}", path.display());
    }

    if build {
        info!(image = %image, "building container image");
        let outcome = ImageBuilder::new(image).build(&layout.root, &spec).await?;
        println!("✅ Built {} in {}s", outcome.tag, outcome.duration_secs);
    }
    Ok(())
}

async fn probe(url: Option<String>, timeout: u64) -> anyhow::Result<()> {
    let url = url.unwrap_or_else(|| ServicePorts::default().health_url());

    let probe = HealthProbe::new()?.with_deadline(Duration::from_secs(timeout));
    let outcome = probe.wait_until_healthy(&url).await?;
    output::print_probe_outcome(&outcome);

    if !outcome.healthy {
        bail!("{} did not become healthy within {}s", outcome.url, timeout);
    }
    Ok(())
}

async fn launch(
    layout: ProjectLayout,
    mode: LaunchMode,
    api_port: u16,
    web_port: u16,
    no_browser: bool,
) -> anyhow::Result<()> {
    let ports = ServicePorts {
        api: api_port,
        web: web_port,
    };
    let launcher = Launcher::new(layout, ports)?;
    launcher.run(mode, !no_browser).await?;
    Ok(())
}

async fn release(
    layout: ProjectLayout,
    plan: ReleasePlan,
    format: OutputFormat,
) -> anyhow::Result<()> {
    info!(target = %plan.target, dry_run = plan.dry_run, "starting release");
    let report: ReleaseReport = ReleasePipeline::standard().run(layout, plan).await?;

    match format {
        OutputFormat::Text => output::print_release_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.success {
        bail!("release halted, see the stage report above");
    }
    Ok(())
}
