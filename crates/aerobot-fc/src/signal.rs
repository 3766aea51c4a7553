use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// The source delivered the exit sentinel.
    Sentinel,
    /// The source stream ended without a sentinel.
    SourceClosed,
    /// Requested from outside the command stream (e.g. Ctrl-C).
    Forced,
}

/// Requests termination of a session. The first request wins; later ones are no-ops.
#[derive(Debug, Clone)]
pub struct Terminator {
    tx: Arc<watch::Sender<Option<TerminationCause>>>,
}

impl Terminator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Returns true only for the request that actually raised the signal.
    pub fn terminate(&self, cause: TerminationCause) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        })
    }

    pub fn cause(&self) -> Option<TerminationCause> {
        *self.tx.borrow()
    }

    /// Resolves once termination has been requested.
    pub async fn requested(&self) -> TerminationCause {
        let mut rx = self.tx.subscribe();
        let cause = match rx.wait_for(Option::is_some).await {
            Ok(cause) => cause.unwrap_or(TerminationCause::Forced),
            // unreachable while `self` holds the sender
            Err(_) => TerminationCause::Forced,
        };
        cause
    }
}

impl Default for Terminator {
    fn default() -> Self {
        Self::new()
    }
}

/// Write side of the session's done signal. Closing consumes it, so it fires once.
#[derive(Debug)]
pub struct DoneSignal {
    tx: watch::Sender<bool>,
}

impl DoneSignal {
    pub fn close(self) {
        self.tx.send_replace(true);
    }
}

/// Lets collaborators outside the core (video player, telemetry loggers) wait for
/// the session to end and tear themselves down in lockstep.
#[derive(Debug, Clone)]
pub struct TerminationMonitor {
    rx: watch::Receiver<bool>,
}

impl TerminationMonitor {
    /// Non-blocking read of the closed flag. A dropped signal counts as closed.
    pub fn is_terminated(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|done| *done).await;
    }
}

pub fn done_signal() -> (DoneSignal, TerminationMonitor) {
    let (tx, rx) = watch::channel(false);
    (DoneSignal { tx }, TerminationMonitor { rx })
}
