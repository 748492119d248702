//! Command-line surface checks: defaults and parse failures.

use aether_deploy::cli::{AetherDeployCli, Commands, OutputFormat, SecretsAction};
use aether_deploy::launch::LaunchMode;
use aether_deploy::types::PlatformKind;
use clap::Parser;

#[test]
fn release_defaults_stay_safe() {
    let cli =
        AetherDeployCli::try_parse_from(["aether-deploy", "release", "--target", "replit"])
            .unwrap();

    match cli.command {
        Commands::Release {
            target,
            message,
            push,
            container,
            force,
            dry_run,
            format,
            ..
        } => {
            assert_eq!(target, Some(PlatformKind::Replit));
            assert_eq!(message, "Deploy AETHER");
            assert!(!push, "publishing must stay opt-in");
            assert!(!container);
            assert!(!force);
            assert!(!dry_run);
            assert_eq!(format, OutputFormat::Text);
        }
        _ => panic!("parsed the wrong command"),
    }
}

#[test]
fn verbosity_accumulates() {
    let cli = AetherDeployCli::try_parse_from(["aether-deploy", "-vv", "targets"]).unwrap();
    assert_eq!(cli.verbose, 2);
}

#[test]
fn launch_uses_the_stack_ports_by_default() {
    let cli = AetherDeployCli::try_parse_from(["aether-deploy", "launch"]).unwrap();
    match cli.command {
        Commands::Launch {
            mode,
            api_port,
            web_port,
            no_browser,
        } => {
            assert_eq!(mode, LaunchMode::Full);
            assert_eq!(api_port, 8000);
            assert_eq!(web_port, 8501);
            assert!(!no_browser);
        }
        _ => panic!("parsed the wrong command"),
    }
}

#[test]
fn secrets_set_takes_key_and_value() {
    let cli = AetherDeployCli::try_parse_from([
        "aether-deploy",
        "secrets",
        "set",
        "OPENAI_API_KEY",
        "sk-live",
    ])
    .unwrap();

    match cli.command {
        Commands::Secrets {
            action: SecretsAction::Set { key, value },
        } => {
            assert_eq!(key, "OPENAI_API_KEY");
            assert_eq!(value, "sk-live");
        }
        _ => panic!("parsed the wrong command"),
    }
}

#[test]
fn unknown_target_is_rejected() {
    let result =
        AetherDeployCli::try_parse_from(["aether-deploy", "check", "--target", "vercel"]);
    assert!(result.is_err());
}

#[test]
fn project_root_is_global() {
    let cli = AetherDeployCli::try_parse_from([
        "aether-deploy",
        "check",
        "--target",
        "render",
        "--project-root",
        "/tmp/aether",
    ])
    .unwrap();
    assert_eq!(cli.project_root, std::path::PathBuf::from("/tmp/aether"));
}
