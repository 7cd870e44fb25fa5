//! Stateful tracking core: filtering, lap timing and per-fix navigation

use model::LocationFix;

pub mod cameras;
pub mod config;
pub mod filter;
pub mod lap;
pub mod pump;
pub mod replay;
pub mod road_name;
pub mod session;
pub mod sinks;

pub use cameras::{CameraAlert, CameraCheck, CameraWatch};
pub use config::{AccuracyTier, LocationRequest, TrackingConfig};
pub use filter::{HeadingFilter, KalmanFilter, SignalFilter};
pub use lap::{LapCommand, LapMachine, LapState, FINISH_EXIT_THRESHOLD_M, PROXIMITY_THRESHOLD_M};
pub use pump::{pump, PumpHandle, REPORT_BACKLOG};
pub use replay::ReplaySource;
pub use road_name::{display_road_name, sanitize_road_label, RoadNameTracker, UNKNOWN_ROAD};
pub use session::{TickReport, TrackingSession};
pub use sinks::{GeocodeError, GeocodedAddress, MemoryRunStore, NullVoice, ReverseGeocoder, RunStore, VoiceSink};

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("{0}")]
    Msg(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type FixTx = crossbeam_channel::Sender<LocationFix>;
pub type FixRx = crossbeam_channel::Receiver<LocationFix>;

/// Anything that produces a live stream of raw fixes
#[async_trait::async_trait]
pub trait LocationSource: Send + Sync {
    async fn run(&self, tx: FixTx) -> Result<(), TrackingError>;
}

pub fn channel() -> (FixTx, FixRx) {
    crossbeam_channel::unbounded()
}
