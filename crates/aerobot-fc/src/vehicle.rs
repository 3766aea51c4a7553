use aerobot_proto::{VehicleEvent, VideoBitRate};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Error, Debug)]
pub enum VehicleError {
    #[error("vehicle not connected")]
    NotConnected,

    #[error("vehicle rejected command: {0}")]
    Rejected(String),

    #[error("link error: {0}")]
    Link(String),

    #[error("event subscription failed: {0}")]
    Subscription(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VehicleResult = Result<(), VehicleError>;

/// Device-side operations of a remotely piloted vehicle.
///
/// Implementations own their transport and are shared between the executor and
/// the video session, so every operation takes `&self`. Calls may block; the
/// core imposes no timeout on them.
pub trait Vehicle: Send + Sync + 'static {
    fn connect(&self) -> VehicleResult;

    /// Inbound notifications (connection, video frames, flight data) produced
    /// by the vehicle's own I/O tasks.
    fn subscribe(&self) -> Result<broadcast::Receiver<VehicleEvent>, VehicleError>;

    fn take_off(&self) -> VehicleResult;
    fn land(&self) -> VehicleResult;
    fn palm_land(&self) -> VehicleResult;

    fn up(&self, amount: u32) -> VehicleResult;
    fn down(&self, amount: u32) -> VehicleResult;
    fn forward(&self, amount: u32) -> VehicleResult;
    fn backward(&self, amount: u32) -> VehicleResult;
    fn left(&self, amount: u32) -> VehicleResult;
    fn right(&self, amount: u32) -> VehicleResult;
    fn clockwise(&self, amount: u32) -> VehicleResult;
    fn counter_clockwise(&self, amount: u32) -> VehicleResult;

    fn hover(&self) -> VehicleResult;
    fn cease_rotation(&self) -> VehicleResult;

    fn front_flip(&self) -> VehicleResult;
    fn back_flip(&self) -> VehicleResult;
    fn left_flip(&self) -> VehicleResult;
    fn right_flip(&self) -> VehicleResult;
    fn bounce(&self) -> VehicleResult;

    fn set_video_encoder_rate(&self, rate: VideoBitRate) -> VehicleResult;
    fn start_video(&self) -> VehicleResult;

    /// Lands if needed and releases the link.
    fn halt(&self) -> VehicleResult;
}
