use std::path::Path;

use anyhow::Context;
use model::{UnitSystem, VoiceMode};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    pub voice_mode: VoiceMode,
    pub unit_system: UnitSystem,
    /// 0..=100
    pub navigation_volume: u8,
    pub ghost_enabled: bool,
    pub battery_saver: bool,
    pub high_accuracy_gps: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            voice_mode: VoiceMode::Normal,
            unit_system: UnitSystem::Kmh,
            navigation_volume: 100,
            ghost_enabled: true,
            battery_saver: false,
            high_accuracy_gps: false,
        }
    }
}

impl TrackingConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let mut cfg: TrackingConfig =
            serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))?;
        cfg.navigation_volume = cfg.navigation_volume.min(100);
        Ok(cfg)
    }

    pub fn is_rally(&self) -> bool {
        self.voice_mode == VoiceMode::Rally
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyTier {
    Balanced,
    High,
    Best,
}

/// Subscription knobs handed to the platform location service.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LocationRequest {
    pub accuracy: AccuracyTier,
    pub time_interval_ms: u64,
    pub distance_interval_m: f64,
}

impl LocationRequest {
    pub fn from_config(cfg: &TrackingConfig) -> Self {
        if cfg.battery_saver {
            Self { accuracy: AccuracyTier::Balanced, time_interval_ms: 1000, distance_interval_m: 10.0 }
        } else if cfg.high_accuracy_gps {
            Self { accuracy: AccuracyTier::Best, time_interval_ms: 16, distance_interval_m: 0.1 }
        } else {
            Self { accuracy: AccuracyTier::High, time_interval_ms: 16, distance_interval_m: 0.1 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: TrackingConfig = serde_json::from_str(r#"{"voice_mode":"rally","unit_system":"mph"}"#).unwrap();
        assert!(cfg.is_rally());
        assert_eq!(cfg.unit_system, UnitSystem::Mph);
        assert_eq!(cfg.navigation_volume, 100);
        assert!(cfg.ghost_enabled);
    }

    #[test]
    fn test_location_request_tiers() {
        let mut cfg = TrackingConfig::default();
        assert_eq!(LocationRequest::from_config(&cfg).accuracy, AccuracyTier::High);
        cfg.high_accuracy_gps = true;
        assert_eq!(LocationRequest::from_config(&cfg).accuracy, AccuracyTier::Best);
        cfg.battery_saver = true;
        let req = LocationRequest::from_config(&cfg);
        assert_eq!(req.accuracy, AccuracyTier::Balanced);
        assert_eq!(req.time_interval_ms, 1000);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(TrackingConfig::load("/definitely/not/here.json").is_err());
    }
}
