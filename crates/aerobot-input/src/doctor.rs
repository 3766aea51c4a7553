use anyhow::{Context, Result};
use std::time::Duration;
use crate::{InputConfig, SourceKind};

/// `settle` is the session's settle interval; scripted commands must be
/// spaced wider than it.
pub fn check_input(cfg: &InputConfig, settle: Duration) -> Result<()> {
    if cfg.source == SourceKind::Script {
        let p = cfg.script.as_ref().context("input.script missing for the script source")?;
        anyhow::ensure!(p.is_file(), "input.script {} not found", p.display());
        anyhow::ensure!(
            cfg.step() > settle,
            "input.step_ms must exceed session.settle_ms"
        );
    }
    Ok(())
}
