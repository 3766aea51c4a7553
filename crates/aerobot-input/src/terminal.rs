use aerobot_proto::{Command, Verbosity};
use anyhow::{Context, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use std::io::stdout;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::keymap::{help, KeyMap, Layout};

/// Reads the controlling terminal in raw mode and feeds mapped commands
/// into the session.
pub struct TerminalSource {
    keymap: KeyMap,
    verbosity: Verbosity,
}

impl TerminalSource {
    pub fn new(layout: Layout, verbosity: Verbosity) -> Self {
        Self { keymap: KeyMap::new(layout), verbosity }
    }

    /// Prints the control help and takes over the terminal. The terminal is
    /// restored when the pump task ends.
    pub fn spawn(self, capacity: usize) -> Result<(mpsc::Receiver<Command>, JoinHandle<()>)> {
        let layout = self.keymap.layout();
        println!("{}", help(layout));

        let guard = RawTerminal::enter(layout == Layout::MakeyMakey)?;
        let (tx, rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            self.pump(tx).await;
        });
        Ok((rx, handle))
    }

    async fn pump(mut self, tx: mpsc::Sender<Command>) {
        let mut events = EventStream::new();
        loop {
            let ev = tokio::select! {
                _ = tx.closed() => break,
                ev = events.next() => ev,
            };
            let ev = match ev {
                Some(Ok(ev)) => ev,
                Some(Err(e)) => {
                    warn!("input: terminal read failed: {}", e);
                    break;
                }
                None => break,
            };
            if self.verbosity >= Verbosity::VeryVerbose {
                trace!("input: {:?}", ev);
            }

            let cmd = match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.keymap.map_key(&key),
                Event::Mouse(m) => self.keymap.map_mouse(&m),
                _ => continue,
            };
            if cmd == Command::None {
                continue;
            }
            if self.verbosity >= Verbosity::Verbose {
                debug!("input: {}", cmd);
            }
            if tx.send(cmd).await.is_err() || cmd == Command::Exit {
                break;
            }
        }
        debug!("input: terminal source stopped");
    }
}

struct RawTerminal {
    mouse: bool,
}

impl RawTerminal {
    fn enter(mouse: bool) -> Result<Self> {
        enable_raw_mode().context("enable terminal raw mode")?;
        if mouse {
            if let Err(e) = execute!(stdout(), EnableMouseCapture) {
                let _ = disable_raw_mode();
                return Err(e).context("enable mouse capture");
            }
        }
        Ok(Self { mouse })
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.mouse {
            let _ = execute!(stdout(), DisableMouseCapture);
        }
        let _ = disable_raw_mode();
    }
}
