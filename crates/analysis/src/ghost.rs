//! Replay of a recorded trajectory against the live run clock.

use model::GhostPoint;

/// Linear lat/lon blend from `a` toward `b`. `t` is clamped to `[0, 1]`.
pub fn interpolate_position(a: &GhostPoint, b: &GhostPoint, t: f64) -> (f64, f64) {
    if b.timestamp_ms <= a.timestamp_ms {
        return (b.latitude, b.longitude);
    }
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
    (
        a.latitude + (b.latitude - a.latitude) * t,
        a.longitude + (b.longitude - a.longitude) * t,
    )
}

/// Where the ghost would be `elapsed_ms` into its own run.
///
/// Progress is proportional to the recorded duration rather than searched by
/// timestamp, so unevenly spaced samples are stretched uniformly.
pub fn ghost_position(path: &[GhostPoint], elapsed_ms: u64) -> Option<(f64, f64)> {
    let first = path.first()?;
    let last = path.last()?;
    if path.len() == 1 {
        return Some((first.latitude, first.longitude));
    }

    let total = last.timestamp_ms.saturating_sub(first.timestamp_ms).max(1) as f64;
    let ratio = elapsed_ms as f64 / total;
    let scaled = ratio * (path.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(path.len() - 1);
    let next = (idx + 1).min(path.len() - 1);

    if idx == next {
        return Some((path[idx].latitude, path[idx].longitude));
    }
    Some(interpolate_position(&path[idx], &path[next], scaled - idx as f64))
}
