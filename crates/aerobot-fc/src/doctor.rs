use anyhow::Result;
use crate::SessionConfig;

pub fn check_session(cfg: &SessionConfig) -> Result<()> {
    cfg.validate()?;
    anyhow::ensure!((1..=100).contains(&cfg.magnitude), "session.magnitude should be 1..100");
    anyhow::ensure!(
        (100..=2000).contains(&cfg.settle_ms),
        "session.settle_ms should be 100..2000 (vehicle needs time to settle)"
    );
    if cfg.max_moves == 0 {
        tracing::warn!("doctor: session.max_moves=0, motion limiter disabled");
    }
    Ok(())
}
