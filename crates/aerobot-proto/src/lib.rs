pub mod command;
pub mod event;
pub mod verbosity;

pub use command::{Command, Direction, UnknownCommand};
pub use event::{FlightData, VehicleEvent, VideoBitRate};
pub use verbosity::Verbosity;
