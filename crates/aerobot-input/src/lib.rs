pub mod doctor;
pub mod keymap;
pub mod script;
pub mod terminal;

pub use keymap::{KeyMap, Layout};
pub use script::{ScriptError, ScriptSource};
pub use terminal::TerminalSource;

use aerobot_proto::{Command, Verbosity};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[default]
    Keyboard,
    MakeyMakey,
    Script,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub source: SourceKind,
    /// Command file for the script source.
    pub script: Option<PathBuf>,
    /// Pause after each scripted command.
    pub step_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { source: SourceKind::default(), script: None, step_ms: 500 }
    }
}

impl InputConfig {
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

/// Starts the configured command source. Failing to open it is fatal.
///
/// Scripted commands are spaced at least `min_step` apart.
pub async fn open_source(
    cfg: &InputConfig,
    verbosity: Verbosity,
    capacity: usize,
    min_step: Duration,
) -> Result<(mpsc::Receiver<Command>, JoinHandle<()>)> {
    match cfg.source {
        SourceKind::Keyboard => TerminalSource::new(Layout::Keyboard, verbosity).spawn(capacity),
        SourceKind::MakeyMakey => TerminalSource::new(Layout::MakeyMakey, verbosity).spawn(capacity),
        SourceKind::Script => {
            let path = cfg.script.as_ref().context("input.script is required for the script source")?;
            let step = cfg.step().max(min_step);
            let script = ScriptSource::open(path).await?.with_step(step);
            Ok(script.spawn(capacity))
        }
    }
}
