use aerobot_proto::Command;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::vehicle::VehicleError;

/// One failed vehicle call, published on the session's error channel.
#[derive(Error, Debug)]
#[error("{command} failed{}: {source}", phase(.stabilizing))]
pub struct ErrorRecord {
    pub command: Command,
    /// The failure happened on the hover / cease-rotation issued after `command`.
    pub stabilizing: bool,
    pub at: OffsetDateTime,
    #[source]
    pub source: VehicleError,
}

fn phase(stabilizing: &bool) -> &'static str {
    if *stabilizing {
        " while stabilizing"
    } else {
        ""
    }
}

impl ErrorRecord {
    pub fn new(command: Command, source: VehicleError) -> Self {
        Self { command, stabilizing: false, at: OffsetDateTime::now_utc(), source }
    }

    pub fn stabilizing(command: Command, source: VehicleError) -> Self {
        Self { stabilizing: true, ..Self::new(command, source) }
    }
}

/// Read side of the error channel. The caller must keep draining it while the
/// session runs: a full channel stalls the executor and, behind it, the input.
pub type ErrorReceiver = mpsc::Receiver<ErrorRecord>;
