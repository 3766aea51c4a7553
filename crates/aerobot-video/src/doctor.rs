use anyhow::Result;
use crate::VideoConfig;

pub fn check_video(cfg: &VideoConfig) -> Result<()> {
    if !cfg.enable {
        return Ok(());
    }
    anyhow::ensure!(!cfg.player.trim().is_empty(), "video.player missing");
    anyhow::ensure!(
        (20..=1000).contains(&cfg.keepalive_ms),
        "video.keepalive_ms should be 20..1000"
    );
    Ok(())
}
