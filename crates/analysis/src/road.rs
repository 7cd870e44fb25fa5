//! Road-ahead sampling and turn detection.
//!
//! The path to the target is sampled on the straight line between the current
//! position and the finish checkpoint, one segment every [`ANALYSIS_STEP_M`].
//! Turns are reported where consecutive bearings diverge past the mode's
//! detection threshold.

use model::*;

use crate::geo::{bearing_deg, distance_m, severity_for_angle, signed_angle_diff};

pub const ANALYSIS_STEP_M: f64 = 25.0;
pub const ROAD_LOOKAHEAD_M: f64 = 800.0;
pub const RALLY_LOOKAHEAD_M: f64 = 1200.0;
pub const TURN_DETECTION_THRESHOLD_DEG: f64 = 12.0;
pub const RALLY_TURN_DETECTION_THRESHOLD_DEG: f64 = 10.0;
const MIN_ANALYSIS_DISTANCE_M: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LookaheadProfile {
    pub lookahead_m: f64,
    pub max_segments: usize,
    pub turn_threshold_deg: f64,
}

impl LookaheadProfile {
    pub fn for_mode(rally: bool) -> Self {
        if rally {
            Self {
                lookahead_m: RALLY_LOOKAHEAD_M,
                max_segments: 48,
                turn_threshold_deg: RALLY_TURN_DETECTION_THRESHOLD_DEG,
            }
        } else {
            Self {
                lookahead_m: ROAD_LOOKAHEAD_M,
                max_segments: 32,
                turn_threshold_deg: TURN_DETECTION_THRESHOLD_DEG,
            }
        }
    }
}

pub fn analyze_road_ahead(
    current_lat: f64,
    current_lon: f64,
    target_lat: f64,
    target_lon: f64,
    rally: bool,
) -> Vec<RoadSegment> {
    let total = distance_m(current_lat, current_lon, target_lat, target_lon);
    if total < MIN_ANALYSIS_DISTANCE_M {
        return Vec::new();
    }

    let profile = LookaheadProfile::for_mode(rally);
    let analysis = total.min(profile.lookahead_m);
    let n = ((analysis / ANALYSIS_STEP_M).floor() as usize).min(profile.max_segments);

    let mut segments: Vec<RoadSegment> = Vec::with_capacity(n);
    for i in 1..=n {
        let fraction = (i as f64 / n as f64) * (analysis / total);
        let lat = current_lat + (target_lat - current_lat) * fraction;
        let lon = current_lon + (target_lon - current_lon) * fraction;

        let (from_lat, from_lon) = segments
            .last()
            .map(|s| (s.latitude, s.longitude))
            .unwrap_or((current_lat, current_lon));
        let bearing = bearing_deg(from_lat, from_lon, lat, lon);

        segments.push(RoadSegment {
            latitude: lat,
            longitude: lon,
            bearing,
            distance_from_start_m: distance_m(current_lat, current_lon, lat, lon),
        });
    }
    segments
}

/// Turns along `segments`, nearest first.
///
/// The first comparison is against the current heading, later ones between
/// neighbouring segment bearings.
pub fn detect_upcoming_turns(segments: &[RoadSegment], current_heading: f64, rally: bool) -> Vec<UpcomingTurn> {
    if segments.len() < 2 {
        return Vec::new();
    }
    let threshold = LookaheadProfile::for_mode(rally).turn_threshold_deg;

    let mut turns = Vec::new();
    for i in 1..segments.len() {
        let prev_bearing = if i == 1 { current_heading } else { segments[i - 1].bearing };
        let angle_diff = signed_angle_diff(prev_bearing, segments[i].bearing);
        let abs_angle = angle_diff.abs();
        if abs_angle <= threshold {
            continue;
        }

        let direction = Direction::from_signed_angle(angle_diff);
        let distance = segments[i].distance_from_start_m;
        turns.push(UpcomingTurn {
            kind: direction.into(),
            severity: severity_for_angle(abs_angle),
            distance_m: distance,
            angle: abs_angle,
            description: describe_turn(direction, abs_angle, distance),
        });
    }
    turns
}

fn describe_turn(direction: Direction, abs_angle: f64, distance: f64) -> String {
    let meters = distance.round() as i64;
    if abs_angle >= 150.0 {
        format!("Sharp {} in {} meters", direction.as_str(), meters)
    } else if abs_angle >= 90.0 {
        let d = match direction {
            Direction::Left => "Left",
            Direction::Right => "Right",
        };
        format!("{} turn in {} meters", d, meters)
    } else {
        format!("Bear {} in {} meters", direction.as_str(), meters)
    }
}
