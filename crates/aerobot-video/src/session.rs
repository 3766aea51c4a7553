use aerobot_fc::{TerminationMonitor, Vehicle};
use aerobot_proto::{VehicleEvent, VideoBitRate};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::VideoConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoStats {
    pub frames: u64,
    pub bytes: u64,
    pub write_errors: u64,
    pub lagged: u64,
}

/// Keeps the vehicle's video stream alive and forwards raw frames to a sink.
///
/// Never touches the command path: sink failures are logged, not reported.
pub struct VideoSession<V: Vehicle> {
    vehicle: Arc<V>,
    events: broadcast::Receiver<VehicleEvent>,
    keepalive: Duration,
    bitrate: VideoBitRate,
}

impl<V: Vehicle> VideoSession<V> {
    /// Registers for vehicle events. Do this before the vehicle connects so the
    /// connection event is not missed. Failure only disables video.
    pub fn subscribe(vehicle: Arc<V>, cfg: &VideoConfig) -> Result<Self> {
        let events = vehicle.subscribe().context("subscribe to vehicle video events")?;
        Ok(Self { vehicle, events, keepalive: cfg.keepalive(), bitrate: cfg.bitrate })
    }

    pub fn spawn<W>(self, sink: W, monitor: TerminationMonitor) -> JoinHandle<VideoStats>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        tokio::spawn(self.run(sink, monitor))
    }

    pub async fn run<W>(mut self, mut sink: W, mut monitor: TerminationMonitor) -> VideoStats
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut stats = VideoStats::default();
        let mut keepalive: Option<JoinHandle<()>> = None;

        loop {
            let ev = tokio::select! {
                biased;
                _ = monitor.wait() => break,
                ev = self.events.recv() => ev,
            };

            match ev {
                Ok(VehicleEvent::Connected) => {
                    if keepalive.is_none() {
                        keepalive = Some(self.on_connected(monitor.clone()));
                    }
                }
                Ok(VehicleEvent::VideoFrame(frame)) => {
                    if monitor.is_terminated() || frame.is_empty() {
                        continue;
                    }
                    match sink.write_all(&frame).await {
                        Ok(()) => {
                            stats.frames += 1;
                            stats.bytes += frame.len() as u64;
                        }
                        Err(e) => {
                            stats.write_errors += 1;
                            warn!("video: frame write failed: {}", e);
                        }
                    }
                }
                Ok(VehicleEvent::FlightData(fd)) => {
                    debug!("video: flight data {:?}", fd);
                }
                Err(RecvError::Lagged(n)) => {
                    stats.lagged += n;
                    warn!("video: lagging behind, skipped {} events", n);
                }
                Err(RecvError::Closed) => {
                    debug!("video: vehicle event channel closed");
                    break;
                }
            }
        }

        if let Some(k) = keepalive {
            k.abort();
            let _ = k.await;
        }
        if let Err(e) = sink.shutdown().await {
            debug!("video: closing sink: {}", e);
        }
        info!("video: stopped ({} frames, {} bytes)", stats.frames, stats.bytes);
        stats
    }

    fn on_connected(&self, monitor: TerminationMonitor) -> JoinHandle<()> {
        info!("video: vehicle connected, starting stream");
        if let Err(e) = self.vehicle.set_video_encoder_rate(self.bitrate) {
            warn!("video: failed to set the encoder rate: {}", e);
        }
        if let Err(e) = self.vehicle.start_video() {
            warn!("video: failed to start video: {}", e);
        }
        tokio::spawn(keep_alive(self.vehicle.clone(), self.keepalive, monitor))
    }
}

// The vehicle stops streaming unless start_video is re-sent periodically.
async fn keep_alive<V: Vehicle>(vehicle: Arc<V>, period: Duration, mut monitor: TerminationMonitor) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick is immediate and start_video was just issued
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = monitor.wait() => break,
            _ = ticker.tick() => {}
        }
        if monitor.is_terminated() {
            break;
        }
        if let Err(e) = vehicle.start_video() {
            warn!("video: keep-alive failed: {}", e);
        }
    }
    debug!("video: keep-alive stopped");
}
