use model::SpeedCamera;

use crate::geo::bearing_deg;

pub const CAMERA_WARNING_DISTANCE_M: f64 = 500.0;
pub const CAMERA_HEADING_TOLERANCE_DEG: f64 = 90.0;
/// Below this the driver is treated as stationary.
pub const CAMERA_MIN_SPEED_KPH: f64 = 5.0;
pub const CAMERA_BANDS_M: [u32; 6] = [50, 100, 200, 300, 400, 500];

/// True when `heading` points at the camera within `tolerance_deg`.
pub fn is_heading_towards(lat: f64, lon: f64, heading: Option<f64>, cam: &SpeedCamera, tolerance_deg: f64) -> bool {
    let heading = match heading {
        Some(h) => h,
        None => return false,
    };
    let mut diff = (bearing_deg(lat, lon, cam.latitude, cam.longitude) - heading).abs();
    if diff > 180.0 {
        diff = 360.0 - diff;
    }
    diff <= tolerance_deg
}

/// Smallest announcement band at or above `distance`.
pub fn camera_band(distance: f64) -> Option<u32> {
    CAMERA_BANDS_M.iter().copied().find(|b| distance <= *b as f64)
}
