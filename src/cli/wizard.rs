use crate::platform::registry;
use crate::types::PlatformKind;
use anyhow::{bail, Context};
use dialoguer::FuzzySelect;
use std::io::IsTerminal;

/// Interactive target picker, used whenever `--target` is omitted.
/// Refuses to prompt when stdin is not a terminal.
pub fn pick_target() -> anyhow::Result<PlatformKind> {
    if !std::io::stdin().is_terminal() {
        bail!("no target given; pass --target <platform> (see `aether-deploy targets`)");
    }

    let targets = registry::registry();
    let items: Vec<String> = targets
        .iter()
        .map(|t| format!("{} ({} ceiling, {} manifest)", t.display_name, t.ceiling, t.manifest))
        .collect();

    let selection = FuzzySelect::new()
        .with_prompt("Deployment target")
        .items(&items)
        .default(0)
        .interact()
        .context("target selection aborted")?;

    Ok(targets[selection].kind)
}

/// `--target` when given, picker otherwise.
pub fn resolve_target(flag: Option<PlatformKind>) -> anyhow::Result<PlatformKind> {
    match flag {
        Some(kind) => Ok(kind),
        None => pick_target(),
    }
}
