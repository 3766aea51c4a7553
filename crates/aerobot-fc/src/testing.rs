//! In-memory vehicle that records every call, for tests of the core and of
//! downstream crates (enable the `test-util` feature).

use aerobot_proto::{VehicleEvent, VideoBitRate};
use std::sync::Mutex;
use tokio::sync::{broadcast, mpsc};

use crate::vehicle::{Vehicle, VehicleError, VehicleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Connect,
    TakeOff,
    Land,
    PalmLand,
    Up(u32),
    Down(u32),
    Forward(u32),
    Backward(u32),
    Left(u32),
    Right(u32),
    Clockwise(u32),
    CounterClockwise(u32),
    Hover,
    CeaseRotation,
    FrontFlip,
    BackFlip,
    LeftFlip,
    RightFlip,
    Bounce,
    SetVideoEncoderRate(VideoBitRate),
    StartVideo,
    Halt,
}

pub struct RecordingVehicle {
    ops: Mutex<Vec<Op>>,
    failing: Mutex<Vec<Op>>,
    refuse_connect: bool,
    refuse_subscribe: bool,
    events: broadcast::Sender<VehicleEvent>,
    notify: mpsc::UnboundedSender<Op>,
}

impl RecordingVehicle {
    /// Returns the vehicle and a stream of its calls in the order they happened.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Op>) {
        let (notify, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);
        let v = Self {
            ops: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
            refuse_connect: false,
            refuse_subscribe: false,
            events,
            notify,
        };
        (v, rx)
    }

    /// Every call equal to one of `ops` fails with a link error (and is still recorded).
    pub fn failing_on(self, ops: impl IntoIterator<Item = Op>) -> Self {
        self.failing.lock().unwrap().extend(ops);
        self
    }

    pub fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    pub fn refusing_subscribe(mut self) -> Self {
        self.refuse_subscribe = true;
        self
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.ops.lock().unwrap().iter().filter(|o| **o == op).count()
    }

    /// Pushes an event to every subscriber, as the vehicle's I/O tasks would.
    pub fn emit(&self, ev: VehicleEvent) {
        let _ = self.events.send(ev);
    }

    fn record(&self, op: Op) -> VehicleResult {
        self.ops.lock().unwrap().push(op);
        let _ = self.notify.send(op);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(VehicleError::Link(format!("{:?} failed", op)));
        }
        Ok(())
    }
}

impl Vehicle for RecordingVehicle {
    fn connect(&self) -> VehicleResult {
        if self.refuse_connect {
            return Err(VehicleError::Link("connection refused".into()));
        }
        self.record(Op::Connect)
    }

    fn subscribe(&self) -> Result<broadcast::Receiver<VehicleEvent>, VehicleError> {
        if self.refuse_subscribe {
            return Err(VehicleError::Subscription("events unavailable".into()));
        }
        Ok(self.events.subscribe())
    }

    fn take_off(&self) -> VehicleResult { self.record(Op::TakeOff) }
    fn land(&self) -> VehicleResult { self.record(Op::Land) }
    fn palm_land(&self) -> VehicleResult { self.record(Op::PalmLand) }

    fn up(&self, amount: u32) -> VehicleResult { self.record(Op::Up(amount)) }
    fn down(&self, amount: u32) -> VehicleResult { self.record(Op::Down(amount)) }
    fn forward(&self, amount: u32) -> VehicleResult { self.record(Op::Forward(amount)) }
    fn backward(&self, amount: u32) -> VehicleResult { self.record(Op::Backward(amount)) }
    fn left(&self, amount: u32) -> VehicleResult { self.record(Op::Left(amount)) }
    fn right(&self, amount: u32) -> VehicleResult { self.record(Op::Right(amount)) }
    fn clockwise(&self, amount: u32) -> VehicleResult { self.record(Op::Clockwise(amount)) }
    fn counter_clockwise(&self, amount: u32) -> VehicleResult { self.record(Op::CounterClockwise(amount)) }

    fn hover(&self) -> VehicleResult { self.record(Op::Hover) }
    fn cease_rotation(&self) -> VehicleResult { self.record(Op::CeaseRotation) }

    fn front_flip(&self) -> VehicleResult { self.record(Op::FrontFlip) }
    fn back_flip(&self) -> VehicleResult { self.record(Op::BackFlip) }
    fn left_flip(&self) -> VehicleResult { self.record(Op::LeftFlip) }
    fn right_flip(&self) -> VehicleResult { self.record(Op::RightFlip) }
    fn bounce(&self) -> VehicleResult { self.record(Op::Bounce) }

    fn set_video_encoder_rate(&self, rate: VideoBitRate) -> VehicleResult {
        self.record(Op::SetVideoEncoderRate(rate))
    }
    fn start_video(&self) -> VehicleResult { self.record(Op::StartVideo) }

    fn halt(&self) -> VehicleResult { self.record(Op::Halt) }
}
