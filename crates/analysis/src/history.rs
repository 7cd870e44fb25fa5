use model::*;
use serde_json::{json, Value};

pub fn runs_for_course<'a>(runs: &'a [RunRecord], course_id: &str) -> Vec<&'a RunRecord> {
    runs.iter().filter(|r| r.course_id == course_id).collect()
}

/// Fastest completed run on the course; the earliest one wins a tie.
pub fn best_run_for_course<'a>(runs: &'a [RunRecord], course_id: &str) -> Option<&'a RunRecord> {
    runs.iter()
        .filter(|r| r.course_id == course_id && r.completed)
        .fold(None, |best: Option<&RunRecord>, r| match best {
            Some(b) if b.duration_ms <= r.duration_ms => Some(b),
            _ => Some(r),
        })
}

pub fn next_lap_number(runs: &[RunRecord], course_id: &str) -> u32 {
    runs_for_course(runs, course_id).len() as u32 + 1
}

pub fn course_summary(runs: &[RunRecord], course_id: &str) -> Value {
    let laps: Vec<&RunRecord> = runs_for_course(runs, course_id)
        .into_iter()
        .filter(|r| r.completed)
        .collect();

    let best = laps.iter().map(|l| l.duration_ms).min().unwrap_or(0);
    let worst = laps.iter().map(|l| l.duration_ms).max().unwrap_or(0);
    let avg = if !laps.is_empty() {
        laps.iter().map(|l| l.duration_ms as f64).sum::<f64>() / (laps.len() as f64)
    } else {
        0.0
    };
    let durations: Vec<f64> = laps.iter().map(|l| l.duration_ms as f64).collect();
    let top_speed = laps.iter().map(|l| l.max_speed_kph).fold(0.0_f64, f64::max);

    json!({
        "course_id": course_id,
        "laps": laps.len(),
        "best_ms": best,
        "worst_ms": worst,
        "avg_ms": avg,
        "consistency": stddev(&durations),
        "top_speed_kph": top_speed
    })
}

fn stddev(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let m = v.iter().sum::<f64>() / (v.len() as f64);
    let var = v.iter().map(|x| {
        let d = *x - m;
        d * d
    }).sum::<f64>() / (v.len() as f64);
    // seconds (input was ms)
    (var.sqrt()) / 1000.0
}
