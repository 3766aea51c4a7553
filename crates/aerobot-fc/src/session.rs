use aerobot_proto::Command;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{ErrorReceiver, ErrorRecord};
use crate::executor::Executor;
use crate::filter::run_filter;
use crate::signal::{done_signal, TerminationMonitor, Terminator};
use crate::state::ExecutorReport;
use crate::vehicle::Vehicle;
use crate::SessionConfig;

/// A running command session: filter and executor tasks plus the handles the
/// caller needs to observe and stop them.
pub struct Session {
    errors: Option<ErrorReceiver>,
    monitor: TerminationMonitor,
    terminator: Terminator,
    filter: JoinHandle<u64>,
    executor: JoinHandle<ExecutorReport>,
}

impl Session {
    /// Connects to the vehicle and spawns the filter and executor.
    ///
    /// A connection failure aborts before anything is spawned. Must be called
    /// from within a tokio runtime.
    pub fn start<V: Vehicle>(
        vehicle: Arc<V>,
        source: mpsc::Receiver<Command>,
        cfg: &SessionConfig,
    ) -> Result<Self> {
        cfg.validate()?;
        vehicle.connect().context("connect to vehicle")?;
        info!("session: vehicle connected");

        let (queue_tx, queue_rx) = mpsc::channel::<Command>(cfg.queue_capacity);
        let (errors_tx, errors_rx) = mpsc::channel::<ErrorRecord>(cfg.error_buffer);
        let (done, monitor) = done_signal();
        let terminator = Terminator::new();

        let executor = Executor::new(vehicle, cfg, queue_rx, errors_tx, terminator.clone(), done);
        let executor = tokio::spawn(executor.run());
        let filter = tokio::spawn(run_filter(source, queue_tx, terminator.clone()));

        Ok(Self { errors: Some(errors_rx), monitor, terminator, filter, executor })
    }

    /// Hands out the error channel. Only the first call returns it; the caller
    /// must drain it until it closes.
    pub fn take_errors(&mut self) -> Option<ErrorReceiver> {
        self.errors.take()
    }

    pub fn monitor(&self) -> TerminationMonitor {
        self.monitor.clone()
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    /// Waits for the executor to reach `Terminated`.
    pub async fn join(self) -> Result<ExecutorReport> {
        let report = self.executor.await.context("executor task")?;
        match self.filter.await {
            Ok(n) => info!("session: filter forwarded {} commands", n),
            Err(e) => warn!("session: filter task failed: {}", e),
        }
        Ok(report)
    }
}
