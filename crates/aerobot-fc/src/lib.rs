pub mod doctor;
pub mod echo;
pub mod error;
pub mod executor;
pub mod filter;
pub mod safety;
pub mod session;
pub mod signal;
pub mod state;
pub mod vehicle;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{ErrorReceiver, ErrorRecord};
pub use session::Session;
pub use signal::{TerminationCause, TerminationMonitor, Terminator};
pub use state::{ExecutorReport, SessionState};
pub use vehicle::{Vehicle, VehicleError, VehicleResult};

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Step applied to every directional and rotational command (cm / degrees).
    pub magnitude: u32,

    /// Per-direction move budget. 0 disables the limiter.
    pub max_moves: u32,

    /// Pause after a maneuver before the stabilizing hover / cease-rotation.
    pub settle_ms: u64,

    /// Depth of the queue between the command filter and the executor.
    pub queue_capacity: usize,

    /// Depth of the error channel. The caller must keep draining it.
    pub error_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            magnitude: 50,
            max_moves: 4,
            settle_ms: 150,
            queue_capacity: filter::DEFAULT_QUEUE_CAPACITY,
            error_buffer: 8,
        }
    }
}

impl SessionConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Hard requirements only; range checks live in `aerobot doctor`.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.queue_capacity > 0, "session.queue_capacity must be > 0");
        anyhow::ensure!(self.error_buffer > 0, "session.error_buffer must be > 0");
        Ok(())
    }
}
