#![allow(dead_code)]

use std::sync::Arc;

use model::*;
use parking_lot::Mutex;
use timeattack_tracking::VoiceSink;

pub const ORIGIN_LAT: f64 = 45.0;
pub const ORIGIN_LON: f64 = 7.0;
/// meters per degree of latitude on the haversine sphere
pub const M_PER_DEG: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn north(m: f64) -> f64 {
    ORIGIN_LAT + m / M_PER_DEG
}

pub fn start_cp() -> Checkpoint {
    Checkpoint::new("start", CheckpointKind::Start, ORIGIN_LAT, ORIGIN_LON)
}

pub fn finish_cp(meters_north: f64) -> Checkpoint {
    Checkpoint::new("finish", CheckpointKind::Finish, north(meters_north), ORIGIN_LON)
}

/// High-accuracy fix `m` meters north of the origin.
pub fn fix_at(m: f64, ts: u64, heading: f64) -> LocationFix {
    LocationFix {
        latitude: north(m),
        longitude: ORIGIN_LON,
        speed_mps: Some(3.0),
        heading: Some(heading),
        timestamp_ms: ts,
        accuracy_m: Some(1.0),
    }
}

#[derive(Clone, Default)]
pub struct RecordingVoice {
    pub spoken: Arc<Mutex<Vec<(String, SpeechParams)>>>,
    pub stops: Arc<Mutex<usize>>,
    /// `speak:<message>` and `stop`, in call order
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingVoice {
    pub fn messages(&self) -> Vec<String> {
        self.spoken.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count(&self, msg: &str) -> usize {
        self.spoken.lock().iter().filter(|(m, _)| m == msg).count()
    }
}

impl VoiceSink for RecordingVoice {
    fn speak(&mut self, message: &str, params: SpeechParams) {
        self.spoken.lock().push((message.to_string(), params));
        self.events.lock().push(format!("speak:{message}"));
    }

    fn stop(&mut self) {
        *self.stops.lock() += 1;
        self.events.lock().push("stop".to_string());
    }
}

/// Start at 0 m, cross the finish 22 m north between the third and fourth fix.
///
/// The filtered position lags the raw fixes, so the last raw fix overshoots
/// the line and the filtered one lands inside the finish ring.
pub const FINISH_M: f64 = 22.0;

/// Distance of the first sampled segment ahead of a point on the course.
pub fn first_segment_m(from_m: f64, finish_m: f64, rally: bool) -> f64 {
    let segs = analysis::analyze_road_ahead(north(from_m), ORIGIN_LON, north(finish_m), ORIGIN_LON, rally);
    segs[1].distance_from_start_m
}

pub fn crossing_fixes(t0: u64) -> Vec<LocationFix> {
    vec![
        fix_at(0.0, t0, 0.0),
        fix_at(7.4, t0 + 4_000, 0.0),
        fix_at(14.8, t0 + 8_000, 0.0),
        fix_at(38.0, t0 + 12_400, 0.0),
    ]
}
