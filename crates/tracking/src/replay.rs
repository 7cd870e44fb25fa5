use std::time::Duration;

use model::LocationFix;

use crate::{FixTx, LocationSource, TrackingError};

/// Replays a recorded drive with its original pacing.
#[derive(Clone, Debug)]
pub struct ReplaySource {
    fixes: Vec<LocationFix>,
    /// 2.0 plays twice as fast; 0 or less sends everything at once
    speed: f64,
}

impl ReplaySource {
    pub fn new(fixes: Vec<LocationFix>) -> Self {
        Self { fixes, speed: 1.0 }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    fn gap(&self, prev_ms: u64, next_ms: u64) -> Option<Duration> {
        if self.speed <= 0.0 || !self.speed.is_finite() {
            return None;
        }
        let ms = next_ms.saturating_sub(prev_ms) as f64 / self.speed;
        (ms >= 1.0).then(|| Duration::from_micros((ms * 1000.0) as u64))
    }
}

#[async_trait::async_trait]
impl LocationSource for ReplaySource {
    async fn run(&self, tx: FixTx) -> Result<(), TrackingError> {
        let mut prev: Option<u64> = None;
        for fix in &self.fixes {
            if let Some(gap) = prev.and_then(|p| self.gap(p, fix.timestamp_ms)) {
                tokio::time::sleep(gap).await;
            }
            prev = Some(fix.timestamp_ms);
            if tx.send(fix.clone()).is_err() {
                tracing::debug!("replay receiver dropped");
                return Ok(());
            }
        }
        tracing::debug!(fixes = self.fixes.len(), "replay complete");
        Ok(())
    }
}
