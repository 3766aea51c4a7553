use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Notification pushed by the vehicle's own I/O tasks.
#[derive(Debug, Clone)]
pub enum VehicleEvent {
    Connected,
    VideoFrame(Bytes),
    FlightData(FlightData),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightData {
    pub battery_percent: Option<u8>,
    pub height_dm: Option<i16>,
    pub wifi_strength: Option<u8>,
    pub flying: bool,
}

/// Encoder bitrate the vehicle streams its camera at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoBitRate {
    #[default]
    Auto,
    #[serde(rename = "1m")]
    Mbps1,
    #[serde(rename = "1.5m")]
    Mbps1_5,
    #[serde(rename = "2m")]
    Mbps2,
    #[serde(rename = "3m")]
    Mbps3,
    #[serde(rename = "4m")]
    Mbps4,
}

impl VideoBitRate {
    /// Wire value used by the vehicle's encoder setting.
    pub fn code(self) -> u8 {
        match self {
            VideoBitRate::Auto => 0,
            VideoBitRate::Mbps1 => 1,
            VideoBitRate::Mbps1_5 => 2,
            VideoBitRate::Mbps2 => 3,
            VideoBitRate::Mbps3 => 4,
            VideoBitRate::Mbps4 => 5,
        }
    }
}
