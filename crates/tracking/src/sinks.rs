//! Ports to the platform services the core talks to.

use model::{RunRecord, SpeechParams};
use serde::{Deserialize, Serialize};

/// Speech output. Implementations queue or drop as they see fit; the core never waits.
pub trait VoiceSink: Send {
    fn speak(&mut self, message: &str, params: SpeechParams);
    /// Cancel whatever is being spoken.
    fn stop(&mut self);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullVoice;

impl VoiceSink for NullVoice {
    fn speak(&mut self, _message: &str, _params: SpeechParams) {}
    fn stop(&mut self) {}
}

pub trait RunStore: Send {
    fn runs_for_course(&self, course_id: &str) -> anyhow::Result<Vec<RunRecord>>;
    fn save_run(&mut self, record: RunRecord) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryRunStore {
    runs: Vec<RunRecord>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runs(runs: Vec<RunRecord>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }
}

impl RunStore for MemoryRunStore {
    fn runs_for_course(&self, course_id: &str) -> anyhow::Result<Vec<RunRecord>> {
        Ok(self.runs.iter().filter(|r| r.course_id == course_id).cloned().collect())
    }

    fn save_run(&mut self, record: RunRecord) -> anyhow::Result<()> {
        self.runs.push(record);
        Ok(())
    }
}

/// Address fields a reverse geocoder may fill, most specific first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeocodedAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub subregion: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("rate limited")]
    RateLimited,
    #[error("geocoder unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Option<GeocodedAddress>, GeocodeError>;
}
