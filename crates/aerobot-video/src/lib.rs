pub mod doctor;
pub mod player;
pub mod session;

pub use player::VideoPlayer;
pub use session::{VideoSession, VideoStats};

use aerobot_proto::VideoBitRate;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub enable: bool,

    /// Player command fed the raw stream on stdin.
    pub player: String,
    pub player_args: Vec<String>,

    /// Period of the start-video keep-alive. The vehicle stops streaming without it.
    pub keepalive_ms: u64,

    pub bitrate: VideoBitRate,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enable: true,
            player: "mplayer".into(),
            player_args: vec!["-fps".into(), "60".into(), "-".into()],
            keepalive_ms: 100,
            bitrate: VideoBitRate::Auto,
        }
    }
}

impl VideoConfig {
    pub fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms)
    }
}
