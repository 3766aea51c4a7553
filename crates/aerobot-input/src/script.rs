use aerobot_proto::{Command, UnknownCommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    Command {
        line: usize,
        #[source]
        source: UnknownCommand,
    },
    #[error("line {line}: invalid wait '{value}', expected milliseconds")]
    Wait { line: usize, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Command(Command),
    Wait(Duration),
}

/// Replays a flight from a text file, one command name per line.
///
/// ```text
/// # square
/// takeoff
/// wait 2000
/// forward
/// right
/// land
/// ```
///
/// Every command is followed by a pause of `step`, which must outlast the
/// session's settle interval: the session drops whatever is still queued
/// when `Exit` arrives, and `Exit` is sent when the script runs out.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    steps: Vec<Step>,
    step: Duration,
}

pub const DEFAULT_STEP: Duration = Duration::from_millis(500);

impl ScriptSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScriptError::Io { path: path.to_path_buf(), source })?;
        let src = Self::parse(&text)?;
        info!("input: loaded {} steps from {}", src.steps.len(), path.display());
        Ok(src)
    }

    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            if let Some(step) = parse_line(i + 1, raw)? {
                steps.push(step);
            }
        }
        Ok(Self { steps, step: DEFAULT_STEP })
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn spawn(self, capacity: usize) -> (mpsc::Receiver<Command>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        (rx, tokio::spawn(self.run(tx)))
    }

    pub async fn run(self, tx: mpsc::Sender<Command>) {
        for step in self.steps {
            match step {
                Step::Wait(d) => tokio::time::sleep(d).await,
                Step::Command(cmd) => {
                    debug!("input: script -> {}", cmd);
                    if tx.send(cmd).await.is_err() {
                        debug!("input: session gone, script stopped");
                        return;
                    }
                    if cmd == Command::Exit {
                        return;
                    }
                    tokio::time::sleep(self.step).await;
                }
            }
        }
        let _ = tx.send(Command::Exit).await;
    }
}

fn parse_line(line: usize, raw: &str) -> Result<Option<Step>, ScriptError> {
    let body = match raw.find('#') {
        Some(i) => &raw[..i],
        None => raw,
    };
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }

    let mut words = body.split_whitespace();
    if let (Some(w), Some(ms)) = (words.next(), words.next()) {
        if w.eq_ignore_ascii_case("wait") && words.next().is_none() {
            let ms: u64 = ms
                .parse()
                .map_err(|_| ScriptError::Wait { line, value: ms.to_string() })?;
            return Ok(Some(Step::Wait(Duration::from_millis(ms))));
        }
    }

    body.parse::<Command>()
        .map(|c| Some(Step::Command(c)))
        .map_err(|source| ScriptError::Command { line, source })
}
