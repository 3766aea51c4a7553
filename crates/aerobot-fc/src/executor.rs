use aerobot_proto::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::error::ErrorRecord;
use crate::safety::DirectionalBudget;
use crate::signal::{DoneSignal, TerminationCause, Terminator};
use crate::state::{ExecutorReport, SessionState};
use crate::vehicle::{Vehicle, VehicleResult};
use crate::SessionConfig;

/// Single consumer of the command queue. Owns the motion budget, the session
/// state and the done signal; nothing else mutates them.
pub struct Executor<V: Vehicle> {
    vehicle: Arc<V>,
    magnitude: u32,
    settle: Duration,
    budget: DirectionalBudget,
    state: SessionState,
    queue: mpsc::Receiver<Command>,
    errors: mpsc::Sender<ErrorRecord>,
    terminator: Terminator,
    done: DoneSignal,

    dispatched: u64,
    dropped: u64,
    failed: u64,
}

impl<V: Vehicle> Executor<V> {
    pub fn new(
        vehicle: Arc<V>,
        cfg: &SessionConfig,
        queue: mpsc::Receiver<Command>,
        errors: mpsc::Sender<ErrorRecord>,
        terminator: Terminator,
        done: DoneSignal,
    ) -> Self {
        Self {
            vehicle,
            magnitude: cfg.magnitude,
            settle: cfg.settle(),
            budget: DirectionalBudget::new(cfg.max_moves),
            state: SessionState::Idle,
            queue,
            errors,
            terminator,
            done,
            dispatched: 0,
            dropped: 0,
            failed: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn budget(&self) -> DirectionalBudget {
        self.budget
    }

    /// Processes queued commands until termination, then shuts the session down.
    ///
    /// The wait is biased towards the termination signal, so once it fires no
    /// further queued command is dispatched.
    pub async fn run(mut self) -> ExecutorReport {
        info!(
            "executor: started (magnitude={}, max_moves={}, settle={:?})",
            self.magnitude,
            self.budget.max_moves(),
            self.settle
        );

        let cause = loop {
            let next = tokio::select! {
                biased;
                cause = self.terminator.requested() => break cause,
                next = self.queue.recv() => next,
            };

            match next {
                Some(cmd) => self.process(cmd).await,
                None => {
                    self.terminator.terminate(TerminationCause::SourceClosed);
                    break self.terminator.cause().unwrap_or(TerminationCause::SourceClosed);
                }
            }
        };

        self.shutdown(cause).await
    }

    pub(crate) async fn process(&mut self, cmd: Command) {
        match cmd {
            Command::None => return,
            Command::Exit => {
                self.terminator.terminate(TerminationCause::Sentinel);
                return;
            }
            _ => {}
        }

        if !self.budget.try_move(cmd) {
            self.dropped += 1;
            trace!("executor: {} dropped, motion budget exhausted", cmd);
            return;
        }

        debug!("executor: dispatching {}", cmd);
        if let Err(e) = dispatch(self.vehicle.as_ref(), cmd, self.magnitude) {
            self.failed += 1;
            self.publish(ErrorRecord::new(cmd, e)).await;
            return;
        }
        self.dispatched += 1;
        self.advance(cmd);

        if !cmd.is_land_or_takeoff() {
            self.stabilize(cmd).await;
        }
    }

    // Deliberately blocks this task: the next command must not overlap the
    // current maneuver.
    async fn stabilize(&mut self, cmd: Command) {
        tokio::time::sleep(self.settle).await;
        let res = if cmd.is_rotation() {
            self.vehicle.cease_rotation()
        } else {
            self.vehicle.hover()
        };
        if let Err(e) = res {
            self.publish(ErrorRecord::stabilizing(cmd, e)).await;
        }
    }

    fn advance(&mut self, cmd: Command) {
        let next = match (self.state, cmd) {
            (SessionState::Idle, Command::TakeOff) => SessionState::Flying,
            (SessionState::Flying, Command::Land | Command::PalmLand) => SessionState::Idle,
            (s, _) => s,
        };
        if next != self.state {
            info!("executor: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    async fn publish(&self, record: ErrorRecord) {
        debug!("executor: {}", record);
        if let Err(mpsc::error::SendError(record)) = self.errors.send(record).await {
            warn!("executor: error channel closed, dropping: {}", record);
        }
    }

    async fn shutdown(mut self, cause: TerminationCause) -> ExecutorReport {
        self.state = SessionState::Terminating;
        self.queue.close();
        info!("executor: terminating ({:?})", cause);

        if let Err(e) = self.vehicle.hover() {
            self.publish(ErrorRecord::stabilizing(Command::Exit, e)).await;
        }
        tokio::time::sleep(self.settle).await;
        if let Err(e) = self.vehicle.halt() {
            self.publish(ErrorRecord::new(Command::Exit, e)).await;
        }

        let report = ExecutorReport {
            state: SessionState::Terminated,
            cause: Some(cause),
            budget: self.budget,
            dispatched: self.dispatched,
            dropped: self.dropped,
            failed: self.failed,
        };

        let Executor { errors, done, .. } = self;
        drop(errors);
        done.close();

        info!(
            "executor: terminated (dispatched={}, dropped={}, failed={})",
            report.dispatched, report.dropped, report.failed
        );
        report
    }
}

fn dispatch<V: Vehicle + ?Sized>(vehicle: &V, cmd: Command, magnitude: u32) -> VehicleResult {
    match cmd {
        Command::TakeOff => vehicle.take_off(),
        Command::Land => vehicle.land(),
        Command::PalmLand => vehicle.palm_land(),

        Command::Up => vehicle.up(magnitude),
        Command::Down => vehicle.down(magnitude),
        Command::Forward => vehicle.forward(magnitude),
        Command::Backward => vehicle.backward(magnitude),
        Command::Left => vehicle.left(magnitude),
        Command::Right => vehicle.right(magnitude),
        Command::RotateRight => vehicle.clockwise(magnitude),
        Command::RotateLeft => vehicle.counter_clockwise(magnitude),

        Command::FrontFlip => vehicle.front_flip(),
        Command::BackFlip => vehicle.back_flip(),
        Command::LeftFlip => vehicle.left_flip(),
        Command::RightFlip => vehicle.right_flip(),
        Command::Bounce => vehicle.bounce(),

        Command::None | Command::Exit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{done_signal, TerminationMonitor};
    use crate::testing::{Op, RecordingVehicle};
    use aerobot_proto::Direction;
    use tokio::time::Instant;

    const MAG: u32 = 30;

    fn cfg(max_moves: u32) -> SessionConfig {
        SessionConfig { magnitude: MAG, max_moves, settle_ms: 150, ..SessionConfig::default() }
    }

    struct Outcome {
        vehicle: Arc<RecordingVehicle>,
        report: ExecutorReport,
        errors: Vec<ErrorRecord>,
        monitor: TerminationMonitor,
    }

    /// Runs `cmds` through an executor whose queue is already closed, so every
    /// command is processed before the session ends.
    async fn run_queue(vehicle: RecordingVehicle, cfg: SessionConfig, cmds: &[Command]) -> Outcome {
        let vehicle = Arc::new(vehicle);
        let (q_tx, q_rx) = mpsc::channel(cmds.len().max(1));
        for c in cmds {
            q_tx.send(*c).await.unwrap();
        }
        drop(q_tx);

        let (e_tx, mut e_rx) = mpsc::channel(64);
        let (done, monitor) = done_signal();
        let report = Executor::new(vehicle.clone(), &cfg, q_rx, e_tx, Terminator::new(), done)
            .run()
            .await;

        let mut errors = Vec::new();
        while let Some(e) = e_rx.recv().await {
            errors.push(e);
        }
        Outcome { vehicle, report, errors, monitor }
    }

    #[tokio::test(start_paused = true)]
    async fn same_direction_beyond_budget_is_dropped() {
        let (v, _) = RecordingVehicle::new();
        let out = run_queue(v, cfg(4), &[Command::Left; 5]).await;

        assert_eq!(out.vehicle.count(Op::Left(MAG)), 4);
        assert_eq!(out.vehicle.count(Op::Hover), 4 + 1);
        assert_eq!(out.report.dispatched, 4);
        assert_eq!(out.report.dropped, 1);
        assert_eq!(out.report.budget.count(Direction::Left), 4);
        assert_eq!(out.report.budget.count(Direction::Right), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_command_costs_no_settle_time() {
        let (v, _) = RecordingVehicle::new();
        let start = Instant::now();
        run_queue(v, cfg(4), &[Command::Left; 5]).await;
        let elapsed = start.elapsed();

        // four stabilizations plus the final settle
        assert!(elapsed >= Duration::from_millis(750), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn reversal_is_dispatched_and_relaxes_budget() {
        let (v, _) = RecordingVehicle::new();
        let out = run_queue(v, cfg(4), &[Command::Left, Command::Left, Command::Right]).await;

        assert_eq!(
            out.vehicle.ops(),
            vec![
                Op::Left(MAG), Op::Hover,
                Op::Left(MAG), Op::Hover,
                Op::Right(MAG), Op::Hover,
                Op::Hover, Op::Halt,
            ]
        );
        assert_eq!(out.report.budget.count(Direction::Left), 1);
        assert_eq!(out.report.budget.count(Direction::Right), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_moves_dispatches_everything() {
        let (v, _) = RecordingVehicle::new();
        let out = run_queue(v, cfg(0), &[Command::Up; 10]).await;

        assert_eq!(out.vehicle.count(Op::Up(MAG)), 10);
        assert_eq!(out.report.dropped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stabilization_depends_on_command_kind() {
        let (v, _) = RecordingVehicle::new();
        let cmds = [
            Command::TakeOff,
            Command::RotateLeft,
            Command::RotateRight,
            Command::Forward,
            Command::FrontFlip,
            Command::Land,
            Command::PalmLand,
        ];
        let out = run_queue(v, cfg(4), &cmds).await;

        assert_eq!(
            out.vehicle.ops(),
            vec![
                Op::TakeOff,
                Op::CounterClockwise(MAG), Op::CeaseRotation,
                Op::Clockwise(MAG), Op::CeaseRotation,
                Op::Forward(MAG), Op::Hover,
                Op::FrontFlip, Op::Hover,
                Op::Land,
                Op::PalmLand,
                Op::Hover, Op::Halt,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dispatch_is_reported_and_skips_stabilization() {
        let (v, _) = RecordingVehicle::new();
        let v = v.failing_on([Op::Left(MAG)]);
        let out = run_queue(v, cfg(4), &[Command::Left, Command::Right]).await;

        assert_eq!(
            out.vehicle.ops(),
            vec![Op::Left(MAG), Op::Right(MAG), Op::Hover, Op::Hover, Op::Halt]
        );
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].command, Command::Left);
        assert!(!out.errors[0].stabilizing);
        assert_eq!(out.report.failed, 1);
        assert_eq!(out.report.dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_stabilization_is_reported_against_its_command() {
        let (v, _) = RecordingVehicle::new();
        let v = v.failing_on([Op::CeaseRotation]);
        let out = run_queue(v, cfg(4), &[Command::RotateRight]).await;

        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].command, Command::RotateRight);
        assert!(out.errors[0].stabilizing);
        assert_eq!(out.report.dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_happens_exactly_once_and_closes_everything() {
        let (v, _) = RecordingVehicle::new();
        let out = run_queue(v, cfg(4), &[Command::TakeOff, Command::Up]).await;

        assert_eq!(out.vehicle.count(Op::Halt), 1);
        assert_eq!(out.vehicle.ops().last(), Some(&Op::Halt));
        assert_eq!(out.report.state, SessionState::Terminated);
        assert_eq!(out.report.cause, Some(TerminationCause::SourceClosed));
        // error channel closed: run_queue's drain loop finished
        assert!(out.errors.is_empty());
        assert!(out.monitor.is_terminated());
    }

    #[tokio::test(start_paused = true)]
    async fn pending_termination_preempts_queued_commands() {
        let (v, _) = RecordingVehicle::new();
        let vehicle = Arc::new(v);
        let (q_tx, q_rx) = mpsc::channel(8);
        for c in [Command::Forward, Command::Left, Command::Right] {
            q_tx.send(c).await.unwrap();
        }

        let terminator = Terminator::new();
        terminator.terminate(TerminationCause::Forced);
        let (e_tx, _e_rx) = mpsc::channel(8);
        let (done, _monitor) = done_signal();

        let report = Executor::new(vehicle.clone(), &cfg(4), q_rx, e_tx, terminator, done)
            .run()
            .await;

        assert_eq!(vehicle.ops(), vec![Op::Hover, Op::Halt]);
        assert_eq!(report.cause, Some(TerminationCause::Forced));
        assert!(q_tx.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn termination_mid_session_stops_after_current_maneuver() {
        let (v, mut ops) = RecordingVehicle::new();
        let vehicle = Arc::new(v);
        let (q_tx, q_rx) = mpsc::channel(8);
        for c in [Command::Forward, Command::Left, Command::Right] {
            q_tx.send(c).await.unwrap();
        }

        let terminator = Terminator::new();
        let (e_tx, _e_rx) = mpsc::channel(8);
        let (done, mut monitor) = done_signal();
        let exec = Executor::new(vehicle.clone(), &cfg(4), q_rx, e_tx, terminator.clone(), done);
        let handle = tokio::spawn(exec.run());

        assert_eq!(ops.recv().await, Some(Op::Forward(MAG)));
        assert!(terminator.terminate(TerminationCause::Forced));

        monitor.wait().await;
        let report = handle.await.unwrap();

        assert_eq!(
            vehicle.ops(),
            vec![Op::Forward(MAG), Op::Hover, Op::Hover, Op::Halt]
        );
        assert_eq!(report.dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exit_in_queue_terminates_before_later_commands() {
        let (v, _) = RecordingVehicle::new();
        let out = run_queue(
            v,
            cfg(4),
            &[Command::Forward, Command::Forward, Command::Exit, Command::Left],
        )
        .await;

        assert_eq!(out.vehicle.count(Op::Forward(MAG)), 2);
        assert_eq!(out.vehicle.count(Op::Left(MAG)), 0);
        assert_eq!(out.report.cause, Some(TerminationCause::Sentinel));
    }

    #[tokio::test(start_paused = true)]
    async fn none_is_a_no_op() {
        let (v, _) = RecordingVehicle::new();
        let out = run_queue(v, cfg(4), &[Command::None, Command::None]).await;
        assert_eq!(out.vehicle.ops(), vec![Op::Hover, Op::Halt]);
        assert_eq!(out.report.dispatched, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn session_state_follows_takeoff_and_landing() {
        let (v, _) = RecordingVehicle::new();
        let vehicle = Arc::new(v);
        let (_q_tx, q_rx) = mpsc::channel(1);
        let (e_tx, _e_rx) = mpsc::channel(8);
        let (done, _monitor) = done_signal();
        let mut exec = Executor::new(vehicle, &cfg(4), q_rx, e_tx, Terminator::new(), done);

        assert_eq!(exec.state(), SessionState::Idle);
        exec.process(Command::TakeOff).await;
        assert_eq!(exec.state(), SessionState::Flying);
        exec.process(Command::Forward).await;
        assert_eq!(exec.state(), SessionState::Flying);
        exec.process(Command::Land).await;
        assert_eq!(exec.state(), SessionState::Idle);
        exec.process(Command::TakeOff).await;
        exec.process(Command::PalmLand).await;
        assert_eq!(exec.state(), SessionState::Idle);
        assert_eq!(exec.budget().count(Direction::Forward), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_takeoff_keeps_session_idle() {
        let (v, _) = RecordingVehicle::new();
        let vehicle = Arc::new(v.failing_on([Op::TakeOff]));
        let (_q_tx, q_rx) = mpsc::channel(1);
        let (e_tx, mut e_rx) = mpsc::channel(8);
        let (done, _monitor) = done_signal();
        let mut exec = Executor::new(vehicle, &cfg(4), q_rx, e_tx, Terminator::new(), done);

        exec.process(Command::TakeOff).await;
        assert_eq!(exec.state(), SessionState::Idle);
        assert_eq!(e_rx.recv().await.map(|e| e.command), Some(Command::TakeOff));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_error_channel_does_not_stop_processing() {
        let (v, _) = RecordingVehicle::new();
        let vehicle = Arc::new(v.failing_on([Op::Up(MAG)]));
        let (q_tx, q_rx) = mpsc::channel(4);
        for c in [Command::Up, Command::Down] {
            q_tx.send(c).await.unwrap();
        }
        drop(q_tx);
        let (e_tx, e_rx) = mpsc::channel(1);
        drop(e_rx);
        let (done, _monitor) = done_signal();

        let report = Executor::new(vehicle.clone(), &cfg(4), q_rx, e_tx, Terminator::new(), done)
            .run()
            .await;

        assert_eq!(report.failed, 1);
        assert_eq!(vehicle.count(Op::Down(MAG)), 1);
    }
}
