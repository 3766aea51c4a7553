use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Abstract pilot command produced by an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    None,
    TakeOff,
    Land,
    PalmLand,

    Up,
    Down,
    Forward,
    Backward,
    Left,
    Right,
    RotateRight,
    RotateLeft,

    FrontFlip,
    BackFlip,
    LeftFlip,
    RightFlip,
    Bounce,

    /// Termination sentinel; never dispatched to the vehicle.
    Exit,
}

/// Translational axis a command moves the vehicle along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl Command {
    pub fn is_rotation(self) -> bool {
        matches!(self, Command::RotateLeft | Command::RotateRight)
    }

    /// Take-off and landing commands settle on their own and skip stabilization.
    pub fn is_land_or_takeoff(self) -> bool {
        matches!(self, Command::TakeOff | Command::Land | Command::PalmLand)
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Command::Forward => Some(Direction::Forward),
            Command::Backward => Some(Direction::Backward),
            Command::Left => Some(Direction::Left),
            Command::Right => Some(Direction::Right),
            Command::Up => Some(Direction::Up),
            Command::Down => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::None => "None",
            Command::TakeOff => "Takeoff",
            Command::Land => "Land",
            Command::PalmLand => "PalmLand",
            Command::Up => "Up",
            Command::Down => "Down",
            Command::Forward => "Forward",
            Command::Backward => "Backward",
            Command::Left => "Left",
            Command::Right => "Right",
            Command::RotateRight => "RotateRight",
            Command::RotateLeft => "RotateLeft",
            Command::FrontFlip => "FrontFlip",
            Command::BackFlip => "BackFlip",
            Command::LeftFlip => "LeftFlip",
            Command::RightFlip => "RightFlip",
            Command::Bounce => "Bounce",
            Command::Exit => "Exit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command: {}", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = match s.trim().to_ascii_lowercase().as_str() {
            "none" => Command::None,
            "takeoff" | "take-off" | "take_off" => Command::TakeOff,
            "land" => Command::Land,
            "palmland" | "palm-land" | "palm_land" => Command::PalmLand,
            "up" => Command::Up,
            "down" => Command::Down,
            "forward" => Command::Forward,
            "backward" | "back" => Command::Backward,
            "left" => Command::Left,
            "right" => Command::Right,
            "rotateright" | "rotate-right" | "cw" => Command::RotateRight,
            "rotateleft" | "rotate-left" | "ccw" => Command::RotateLeft,
            "frontflip" | "front-flip" => Command::FrontFlip,
            "backflip" | "back-flip" => Command::BackFlip,
            "leftflip" | "left-flip" => Command::LeftFlip,
            "rightflip" | "right-flip" => Command::RightFlip,
            "bounce" => Command::Bounce,
            "exit" | "quit" => Command::Exit,
            _ => return Err(UnknownCommand(s.trim().to_string())),
        };
        Ok(cmd)
    }
}
