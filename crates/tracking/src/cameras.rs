use std::collections::{HashMap, HashSet};

use analysis::cameras::{camera_band, is_heading_towards, CAMERA_HEADING_TOLERANCE_DEG, CAMERA_MIN_SPEED_KPH, CAMERA_WARNING_DISTANCE_M};
use analysis::geo::distance_m;
use model::{FilteredLocation, SpeedCamera};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CameraAlert {
    pub camera_id: String,
    pub distance_m: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraCheck {
    /// nearest camera the driver is heading towards
    pub nearest: Option<CameraAlert>,
    /// bands to announce now, as `(camera id, band)`
    pub announce: Vec<(String, u32)>,
}

/// Remembers which distance bands were already announced for each camera.
#[derive(Clone, Debug, Default)]
pub struct CameraWatch {
    announced: HashMap<String, HashSet<u32>>,
}

impl CameraWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.announced.clear();
    }

    pub fn check(&mut self, loc: &FilteredLocation, cameras: &[SpeedCamera], running: bool) -> CameraCheck {
        let mut out = CameraCheck::default();

        for cam in cameras {
            let d = distance_m(loc.latitude, loc.longitude, cam.latitude, cam.longitude);
            if d > CAMERA_WARNING_DISTANCE_M {
                self.announced.remove(&cam.id);
                continue;
            }

            let approaching = loc.speed_kph > CAMERA_MIN_SPEED_KPH
                && is_heading_towards(loc.latitude, loc.longitude, loc.heading, cam, CAMERA_HEADING_TOLERANCE_DEG);
            if !approaching {
                continue;
            }

            if out.nearest.as_ref().map_or(true, |n| d < n.distance_m) {
                out.nearest = Some(CameraAlert { camera_id: cam.id.clone(), distance_m: d });
            }

            if running {
                if let Some(band) = camera_band(d) {
                    if self.announced.entry(cam.id.clone()).or_default().insert(band) {
                        tracing::debug!(camera = %cam.id, band, "speed camera band reached");
                        out.announce.push((cam.id.clone(), band));
                    }
                }
            }
        }
        out
    }
}
