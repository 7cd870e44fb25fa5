//! Current road name, throttled reverse geocoding and label cleanup.

use analysis::geo::distance_m;

use crate::sinks::{GeocodeError, GeocodedAddress};

pub const UNKNOWN_ROAD: &str = "Unknown Road";
pub const ROAD_NAME_INTERVAL_MS: u64 = 8_000;
pub const ROAD_NAME_MIN_DISTANCE_M: f64 = 80.0;
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

const ROAD_KEYWORDS: &[&str] = &[
    "road", "street", "avenue", "lane", "drive", "way", "boulevard", "highway", "route", "expressway",
    "motorway", "parkway", "circuit", "track", "speedway", "raceway", "causeway", "arterial", "turnpike",
    "pass", "trail",
];

const PRIVACY_BLOCKLIST: &[&str] = &[
    "house", "cottage", "villa", "suite", "apartment", "flat", "building", "residence", "bungalow",
    "manor", "lodge", "farm", "estate", "hall", "barn", "chalet", "homestead", "studio", "warehouse",
];

/// Clean one address field into a road label, or reject it.
pub fn sanitize_road_label(value: &str) -> Option<String> {
    let segment = value.split(',').next().unwrap_or("").trim();
    let segment = strip_number_prefix(segment);
    let segment = strip_house_number(segment);
    let segment = segment.split_whitespace().collect::<Vec<_>>().join(" ");
    if segment.is_empty() {
        return None;
    }

    let lower = segment.to_lowercase();
    if PRIVACY_BLOCKLIST.iter().any(|t| lower.contains(t)) {
        return None;
    }
    let has_keyword = ROAD_KEYWORDS.iter().any(|k| lower.contains(k));
    let has_route_code = segment.split_whitespace().any(|tok| {
        let cleaned: String = tok.chars().filter(|c| *c != '(' && *c != ')').collect();
        is_route_code(&cleaned.to_uppercase())
    });
    if !has_keyword && !has_route_code {
        return None;
    }
    Some(segment)
}

/// First acceptable field among street, name, district and subregion.
pub fn display_road_name(addr: &GeocodedAddress) -> String {
    [&addr.street, &addr.name, &addr.district, &addr.subregion]
        .into_iter()
        .flatten()
        .find_map(|v| sanitize_road_label(v))
        .unwrap_or_else(|| UNKNOWN_ROAD.to_string())
}

// "No. ", "number ", "#"
fn strip_number_prefix(s: &str) -> &str {
    let lower = s.to_ascii_lowercase();
    for prefix in ["number", "no.", "no", "#"] {
        if lower.starts_with(prefix) {
            let rest = &s[prefix.len()..];
            // "no" must be a standalone token
            if prefix == "no" && !rest.starts_with(char::is_whitespace) {
                continue;
            }
            return rest.trim_start();
        }
    }
    s
}

// "12 ", "12b " but not "1st", "42nd"
fn strip_house_number(s: &str) -> &str {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return s;
    }
    let rest = &s[digits..];
    let lower = rest.to_ascii_lowercase();
    for suffix in ["st", "nd", "rd", "th"] {
        if lower.starts_with(suffix) && !lower[suffix.len()..].starts_with(|c: char| c.is_alphanumeric()) {
            return s;
        }
    }
    let mut rest = rest;
    if rest.starts_with(|c: char| c.is_ascii_alphabetic()) && !rest[1..].starts_with(|c: char| c.is_alphanumeric()) {
        rest = &rest[1..];
    }
    rest.trim_start()
}

// I-95, US-1, SR-9, PR-2, CR-10, M25, A1, B1234-style codes
fn is_route_code(tok: &str) -> bool {
    let split_at = tok.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(tok.len());
    let (letters, rest) = tok.split_at(split_at);
    let dashed = matches!(letters, "I" | "US" | "SR" | "PR" | "CR");
    let rest = if dashed { rest.strip_prefix('-').unwrap_or(rest) } else { rest };

    let num_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if !(1..=3).contains(&num_len) {
        return false;
    }
    let tail = &rest[num_len..];
    match letters {
        "US" | "SR" | "PR" | "CR" => tail.is_empty(),
        "I" => tail.is_empty() || (tail.len() == 1 && tail.chars().all(|c| c.is_ascii_uppercase())),
        l if (1..=2).contains(&l.len()) => {
            tail.is_empty() || (tail.len() == 1 && tail.chars().all(|c| c.is_ascii_uppercase()))
        }
        _ => false,
    }
}

/// Throttles lookups and decides what the displayed road name should be.
#[derive(Debug, Clone)]
pub struct RoadNameTracker {
    current: Option<String>,
    last_request: Option<(u64, f64, f64)>,
    failures: u32,
}

impl Default for RoadNameTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RoadNameTracker {
    pub fn new() -> Self {
        Self { current: None, last_request: None, failures: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Both the interval and the distance must have elapsed since the last lookup.
    pub fn should_lookup(&self, now_ms: u64, latitude: f64, longitude: f64) -> bool {
        match self.last_request {
            None => true,
            Some((ts, lat, lon)) => {
                now_ms.saturating_sub(ts) >= ROAD_NAME_INTERVAL_MS
                    && distance_m(lat, lon, latitude, longitude) >= ROAD_NAME_MIN_DISTANCE_M
            }
        }
    }

    pub fn mark_requested(&mut self, now_ms: u64, latitude: f64, longitude: f64) {
        self.last_request = Some((now_ms, latitude, longitude));
    }

    pub fn apply(&mut self, result: Result<Option<GeocodedAddress>, GeocodeError>) {
        match result {
            Ok(Some(addr)) => {
                self.failures = 0;
                let name = display_road_name(&addr);
                tracing::debug!(road = %name, "road name updated");
                self.current = Some(name);
            }
            Ok(None) => {
                self.failures = 0;
            }
            Err(GeocodeError::RateLimited) => {
                tracing::debug!("geocoder rate limited, keeping {:?}", self.current);
            }
            Err(e) => {
                self.failures += 1;
                tracing::warn!(failures = self.failures, "reverse geocode failed: {e}");
                if self.failures >= MAX_CONSECUTIVE_FAILURES {
                    self.current = Some(UNKNOWN_ROAD.to_string());
                }
            }
        }
    }
}
