use aerobot_fc::TerminationMonitor;
use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info, warn};

use crate::VideoConfig;

/// External player reading the raw stream on stdin (`mplayer -fps 60 -` by default).
pub struct VideoPlayer {
    name: String,
    child: Child,
}

impl VideoPlayer {
    /// Starts the player and returns its stdin as the video sink.
    pub fn spawn(cfg: &VideoConfig) -> Result<(Self, ChildStdin)> {
        anyhow::ensure!(!cfg.player.is_empty(), "video.player is empty");

        let mut cmd = Command::new(&cfg.player);
        cmd.args(&cfg.player_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        debug!("player: {} {:?}", cfg.player, cfg.player_args);
        let mut child = cmd
            .spawn()
            .with_context(|| format!("start video player {}", cfg.player))?;
        let stdin = child.stdin.take().context("video player stdin not piped")?;

        info!("player: started {}", cfg.player);
        Ok((Self { name: cfg.player.clone(), child }, stdin))
    }

    /// Waits for the player to exit, killing it once the session terminates.
    /// Returns `None` if the player had to be killed.
    pub async fn supervise(mut self, mut monitor: TerminationMonitor) -> Result<Option<ExitStatus>> {
        tokio::select! {
            status = self.child.wait() => {
                let status = status.with_context(|| format!("wait for {}", self.name))?;
                if !status.success() {
                    warn!("player: {} exited with {}", self.name, status);
                }
                Ok(Some(status))
            }
            _ = monitor.wait() => {
                debug!("player: session terminated, stopping {}", self.name);
                self.child.kill().await.with_context(|| format!("kill {}", self.name))?;
                Ok(None)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use aerobot_fc::signal::done_signal;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn cat() -> VideoConfig {
        VideoConfig { player: "cat".into(), player_args: vec![], ..VideoConfig::default() }
    }

    #[tokio::test]
    async fn player_is_killed_when_session_ends() {
        let (player, mut stdin) = VideoPlayer::spawn(&cat()).unwrap();
        stdin.write_all(b"frame").await.unwrap();

        let (done, monitor) = done_signal();
        let supervisor = tokio::spawn(player.supervise(monitor));
        done.close();

        let res = tokio::time::timeout(Duration::from_secs(5), supervisor).await.unwrap();
        assert!(res.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn player_exiting_on_its_own_is_reported() {
        let (player, stdin) = VideoPlayer::spawn(&cat()).unwrap();
        // EOF on stdin ends cat
        drop(stdin);

        let (_done, monitor) = done_signal();
        let status = tokio::time::timeout(Duration::from_secs(5), player.supervise(monitor))
            .await
            .unwrap()
            .unwrap();
        assert!(status.map(|s| s.success()).unwrap_or(false));
    }

    #[tokio::test]
    async fn missing_player_binary_fails_to_spawn() {
        let cfg = VideoConfig { player: "aerobot-no-such-player".into(), ..VideoConfig::default() };
        let err = VideoPlayer::spawn(&cfg).err().expect("spawn must fail");
        assert!(format!("{:#}", err).contains("aerobot-no-such-player"));
    }
}
