use aerobot_proto::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::signal::{TerminationCause, Terminator};

/// Default capacity of the queue between filter and executor. Input devices must
/// never block on flight-control backpressure in normal operation.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Forwards source commands into the executor queue until the exit sentinel.
///
/// On the sentinel (or when the source ends) termination is raised and the rest
/// of the input is discarded. Returns the number of forwarded commands.
pub async fn run_filter(
    mut source: mpsc::Receiver<Command>,
    queue: mpsc::Sender<Command>,
    terminator: Terminator,
) -> u64 {
    let mut forwarded = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            cause = terminator.requested() => {
                debug!("filter: session terminating ({:?}), stop forwarding", cause);
                return forwarded;
            }
            next = source.recv() => next,
        };

        let Some(cmd) = next else {
            if terminator.terminate(TerminationCause::SourceClosed) {
                info!("filter: source closed, terminating session");
            }
            return forwarded;
        };

        if cmd == Command::Exit {
            if terminator.terminate(TerminationCause::Sentinel) {
                info!("filter: exit received, terminating session");
            }
            return forwarded;
        }

        if queue.send(cmd).await.is_err() {
            debug!("filter: executor queue closed");
            return forwarded;
        }
        forwarded += 1;
    }
}
