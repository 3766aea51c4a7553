use aerobot_proto::{VehicleEvent, VideoBitRate};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::broadcast;
use tracing::info;

use crate::vehicle::{Vehicle, VehicleError, VehicleResult};

/// A vehicle without a vehicle: logs every operation it receives.
///
/// Useful for dry runs of an input setup before pointing it at real hardware.
pub struct EchoVehicle {
    events: broadcast::Sender<VehicleEvent>,
    connected: AtomicBool,
    sequence: AtomicU32,
}

impl EchoVehicle {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { events, connected: AtomicBool::new(false), sequence: AtomicU32::new(0) }
    }

    fn send(&self, op: &str) -> VehicleResult {
        if !self.connected.load(Ordering::Acquire) {
            return Err(VehicleError::NotConnected);
        }
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        info!("echo[{}]: {}", seq, op);
        Ok(())
    }
}

impl Default for EchoVehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl Vehicle for EchoVehicle {
    fn connect(&self) -> VehicleResult {
        self.connected.store(true, Ordering::Release);
        info!("echo: connected");
        // nobody listening yet is fine
        let _ = self.events.send(VehicleEvent::Connected);
        Ok(())
    }

    fn subscribe(&self) -> Result<broadcast::Receiver<VehicleEvent>, VehicleError> {
        Ok(self.events.subscribe())
    }

    fn take_off(&self) -> VehicleResult { self.send("takeoff") }
    fn land(&self) -> VehicleResult { self.send("land") }
    fn palm_land(&self) -> VehicleResult { self.send("palm land") }

    fn up(&self, amount: u32) -> VehicleResult { self.send(&format!("up {}", amount)) }
    fn down(&self, amount: u32) -> VehicleResult { self.send(&format!("down {}", amount)) }
    fn forward(&self, amount: u32) -> VehicleResult { self.send(&format!("forward {}", amount)) }
    fn backward(&self, amount: u32) -> VehicleResult { self.send(&format!("backward {}", amount)) }
    fn left(&self, amount: u32) -> VehicleResult { self.send(&format!("left {}", amount)) }
    fn right(&self, amount: u32) -> VehicleResult { self.send(&format!("right {}", amount)) }
    fn clockwise(&self, amount: u32) -> VehicleResult { self.send(&format!("cw {}", amount)) }
    fn counter_clockwise(&self, amount: u32) -> VehicleResult { self.send(&format!("ccw {}", amount)) }

    fn hover(&self) -> VehicleResult { self.send("hover") }
    fn cease_rotation(&self) -> VehicleResult { self.send("cease rotation") }

    fn front_flip(&self) -> VehicleResult { self.send("flip f") }
    fn back_flip(&self) -> VehicleResult { self.send("flip b") }
    fn left_flip(&self) -> VehicleResult { self.send("flip l") }
    fn right_flip(&self) -> VehicleResult { self.send("flip r") }
    fn bounce(&self) -> VehicleResult { self.send("bounce") }

    fn set_video_encoder_rate(&self, rate: VideoBitRate) -> VehicleResult {
        self.send(&format!("video bitrate {}", rate.code()))
    }
    fn start_video(&self) -> VehicleResult { self.send("streamon") }

    fn halt(&self) -> VehicleResult {
        self.send("halt")?;
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}
