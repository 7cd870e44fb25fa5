//! Fix smoothing.
//!
//! Latitude, longitude and speed each run through a scalar Kalman filter whose
//! measurement noise scales with the fix's reported accuracy. Heading uses a
//! circular mean over the last few samples so that 359° and 1° average to 0°.

use std::collections::VecDeque;

use analysis::geo::{bearing_deg, distance_m, wrap_360};
use model::{FilteredLocation, LocationFix};

const OUTLIER_SIGMAS: f64 = 3.0;
const OUTLIER_BLEND: f64 = 0.3;
const DEFAULT_ACCURACY_M: f64 = 10.0;
const MAX_POSITION_ACCURACY_M: f64 = 50.0;
const MAX_SPEED_ACCURACY_M: f64 = 20.0;
const HEADING_WINDOW: usize = 5;
/// Movement below this is too small to derive a heading from.
const MIN_HEADING_MOVE_M: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct KalmanFilter {
    q: f64,
    r: f64,
    p: f64,
    x: f64,
    k: f64,
    last: Option<f64>,
}

impl KalmanFilter {
    pub fn new(q: f64, r: f64) -> Self {
        Self { q, r, p: 1.0, x: 0.0, k: 0.0, last: None }
    }

    /// Position axes, in degrees.
    pub fn position() -> Self {
        Self::new(0.005, 0.3)
    }

    /// Speed, in km/h.
    pub fn speed() -> Self {
        Self::new(0.03, 0.8)
    }

    pub fn estimate(&self) -> f64 {
        self.x
    }

    pub fn gain(&self) -> f64 {
        self.k
    }

    pub fn filter(&mut self, measurement: f64, accuracy: f64) -> f64 {
        let last = match self.last {
            Some(v) => v,
            None => {
                self.x = measurement;
                self.last = Some(measurement);
                return measurement;
            }
        };

        let mut m = measurement;
        if (m - last).abs() > OUTLIER_SIGMAS * (self.p + self.r).sqrt() {
            tracing::debug!(measurement, last, "outlier damped");
            m = last + (m - last) * OUTLIER_BLEND;
        }

        let adjusted_r = self.r * (accuracy / 10.0).clamp(0.1, 3.0);
        self.p += self.q;
        self.k = self.p / (self.p + adjusted_r);
        self.x += self.k * (m - self.x);
        self.p *= 1.0 - self.k;

        self.last = Some(self.x);
        self.x
    }

    pub fn reset(&mut self) {
        self.p = 1.0;
        self.x = 0.0;
        self.k = 0.0;
        self.last = None;
    }
}

#[derive(Clone, Debug, Default)]
pub struct HeadingFilter {
    values: VecDeque<f64>,
}

impl HeadingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A missing sample leaves the window untouched and repeats the current mean.
    pub fn filter(&mut self, heading: Option<f64>) -> Option<f64> {
        if let Some(h) = heading {
            self.values.push_back(h);
            if self.values.len() > HEADING_WINDOW {
                self.values.pop_front();
            }
        }
        self.smoothed()
    }

    pub fn smoothed(&self) -> Option<f64> {
        match self.values.len() {
            0 => None,
            1 => self.values.front().copied(),
            n => {
                let (sum_sin, sum_cos) = self.values.iter().fold((0.0, 0.0), |(s, c), deg: &f64| {
                    let rad = deg.to_radians();
                    (s + rad.sin(), c + rad.cos())
                });
                let mean = (sum_sin / n as f64).atan2(sum_cos / n as f64).to_degrees();
                Some(wrap_360(mean))
            }
        }
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Per-session smoothing state plus a constant-velocity predictor.
#[derive(Clone, Debug)]
pub struct SignalFilter {
    lat: KalmanFilter,
    lon: KalmanFilter,
    speed: KalmanFilter,
    heading: HeadingFilter,
    last: Option<FilteredLocation>,
    // degrees per second
    velocity_lat: f64,
    velocity_lon: f64,
}

impl Default for SignalFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalFilter {
    pub fn new() -> Self {
        Self {
            lat: KalmanFilter::position(),
            lon: KalmanFilter::position(),
            speed: KalmanFilter::speed(),
            heading: HeadingFilter::new(),
            last: None,
            velocity_lat: 0.0,
            velocity_lon: 0.0,
        }
    }

    pub fn last(&self) -> Option<&FilteredLocation> {
        self.last.as_ref()
    }

    pub fn process(&mut self, fix: &LocationFix) -> FilteredLocation {
        let accuracy = fix.accuracy_m.filter(|a| *a > 0.0).unwrap_or(DEFAULT_ACCURACY_M);

        let position_accuracy = accuracy.min(MAX_POSITION_ACCURACY_M);
        let lat = self.lat.filter(fix.latitude, position_accuracy);
        let lon = self.lon.filter(fix.longitude, position_accuracy);

        let raw_kph = fix.speed_mps.unwrap_or(0.0) * 3.6;
        let speed_kph = self.speed.filter(raw_kph, accuracy.min(MAX_SPEED_ACCURACY_M)).max(0.0);

        if let Some(prev) = &self.last {
            let dt = (fix.timestamp_ms as f64 - prev.timestamp_ms as f64) / 1000.0;
            if dt > 0.0 {
                self.velocity_lat = (lat - prev.latitude) / dt;
                self.velocity_lon = (lon - prev.longitude) / dt;
            }
        }

        let heading = self.heading.filter(fix.heading).or_else(|| self.course_over_ground(lat, lon));

        let out = FilteredLocation {
            latitude: lat,
            longitude: lon,
            speed_kph,
            heading,
            timestamp_ms: fix.timestamp_ms,
            accuracy_m: accuracy,
        };
        self.last = Some(out.clone());
        out
    }

    fn course_over_ground(&self, lat: f64, lon: f64) -> Option<f64> {
        let prev = self.last.as_ref()?;
        if distance_m(prev.latitude, prev.longitude, lat, lon) < MIN_HEADING_MOVE_M {
            return prev.heading;
        }
        Some(bearing_deg(prev.latitude, prev.longitude, lat, lon))
    }

    /// Dead-reckoned position `dt_s` seconds after the last fix.
    pub fn predict(&self, dt_s: f64) -> Option<FilteredLocation> {
        let last = self.last.as_ref()?;
        let advance_ms = (dt_s * 1000.0).round().max(0.0) as u64;
        Some(FilteredLocation {
            latitude: last.latitude + self.velocity_lat * dt_s,
            longitude: last.longitude + self.velocity_lon * dt_s,
            speed_kph: last.speed_kph,
            heading: last.heading,
            timestamp_ms: last.timestamp_ms + advance_ms,
            accuracy_m: last.accuracy_m * 1.5,
        })
    }

    pub fn reset(&mut self) {
        self.lat.reset();
        self.lon.reset();
        self.speed.reset();
        self.heading.reset();
        self.last = None;
        self.velocity_lat = 0.0;
        self.velocity_lon = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis::geo::signed_angle_diff;

    fn fix(lat: f64, lon: f64, ts: u64) -> LocationFix {
        LocationFix {
            latitude: lat,
            longitude: lon,
            speed_mps: Some(10.0),
            heading: None,
            timestamp_ms: ts,
            accuracy_m: Some(5.0),
        }
    }

    #[test]
    fn test_first_measurement_passes_through() {
        let mut k = KalmanFilter::position();
        assert_eq!(k.filter(45.123, 10.0), 45.123);
        assert_eq!(k.estimate(), 45.123);
    }

    #[test]
    fn test_kalman_converges_to_constant() {
        let mut k = KalmanFilter::speed();
        k.filter(0.0, 10.0);
        let mut out = 0.0;
        for _ in 0..300 {
            out = k.filter(50.0, 10.0);
        }
        assert!((out - 50.0).abs() < 1e-3, "got {}", out);
        assert!(k.gain() > 0.0 && k.gain() < 1.0);
    }

    #[test]
    fn test_outlier_is_damped() {
        let mut k = KalmanFilter::new(0.005, 0.3);
        for _ in 0..50 {
            k.filter(10.0, 10.0);
        }
        let out = k.filter(1000.0, 10.0);
        // damping keeps the step well under the blended 30%
        assert!(out - 10.0 < 0.3 * 990.0, "got {}", out);
        assert!(out > 10.0);
    }

    #[test]
    fn test_poor_accuracy_trusted_less() {
        let mut good = KalmanFilter::new(0.005, 0.3);
        let mut bad = KalmanFilter::new(0.005, 0.3);
        good.filter(0.0, 5.0);
        bad.filter(0.0, 30.0);
        let g = good.filter(1.0, 5.0);
        let b = bad.filter(1.0, 30.0);
        assert!(g > b);
    }

    #[test]
    fn test_reset_cold_starts() {
        let mut k = KalmanFilter::position();
        k.filter(1.0, 10.0);
        k.filter(2.0, 10.0);
        k.reset();
        assert_eq!(k.filter(7.0, 10.0), 7.0);
    }

    #[test]
    fn test_heading_wraparound() {
        let mut h = HeadingFilter::new();
        h.filter(Some(350.0));
        let out = h.filter(Some(10.0)).unwrap();
        assert!(signed_angle_diff(0.0, out).abs() < 1e-6, "got {}", out);
        assert!((0.0..360.0).contains(&out));
    }

    #[test]
    fn test_heading_null_repeats_mean() {
        let mut h = HeadingFilter::new();
        assert_eq!(h.filter(None), None);
        assert_eq!(h.filter(Some(42.0)), Some(42.0));
        assert_eq!(h.filter(None), Some(42.0));
    }

    #[test]
    fn test_heading_window_drops_oldest() {
        let mut h = HeadingFilter::new();
        h.filter(Some(180.0));
        for _ in 0..5 {
            h.filter(Some(90.0));
        }
        assert!((h.smoothed().unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometric_heading_fallback() {
        let mut f = SignalFilter::new();
        let a = f.process(&fix(45.0, 7.0, 0));
        assert_eq!(a.heading, None);
        // heading north from the raw fixes; the filter lags but keeps the direction
        let b = f.process(&fix(45.001, 7.0, 1000));
        let h = b.heading.unwrap();
        assert!(signed_angle_diff(0.0, h).abs() < 1.0, "got {}", h);
    }

    #[test]
    fn test_speed_converted_and_accuracy_defaulted() {
        let mut f = SignalFilter::new();
        let out = f.process(&LocationFix {
            latitude: 1.0,
            longitude: 1.0,
            speed_mps: Some(10.0),
            heading: Some(90.0),
            timestamp_ms: 5,
            accuracy_m: None,
        });
        assert!((out.speed_kph - 36.0).abs() < 1e-9);
        assert_eq!(out.accuracy_m, 10.0);
        assert_eq!(out.heading, Some(90.0));
    }

    #[test]
    fn test_predict_extrapolates() {
        let mut f = SignalFilter::new();
        assert!(f.predict(1.0).is_none());
        f.process(&fix(45.0, 7.0, 0));
        let b = f.process(&fix(45.001, 7.0, 1000));
        let p = f.predict(2.0).unwrap();
        assert!(p.latitude > b.latitude);
        assert_eq!(p.timestamp_ms, 3000);
        assert!((p.accuracy_m - 7.5).abs() < 1e-9);
    }
}
