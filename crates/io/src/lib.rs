use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use model::*;

mod store;

pub use store::NdjsonRunStore;

pub fn import_runs_ndjson(path: &Path) -> Result<Vec<RunRecord>> {
    read_ndjson(path)
}

pub fn export_runs_ndjson(runs: &[RunRecord], path: &Path) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for r in runs {
        let s = serde_json::to_string(r)?;
        writeln!(w, "{}", s)?;
    }
    w.flush()?;
    Ok(())
}

/// One row per run, without the ghost path.
pub fn export_runs_csv(runs: &[RunRecord], path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for r in runs {
        w.serialize(RunRow {
            id: r.id.simple().to_string(),
            course_id: r.course_id.clone(),
            lap_number: r.lap_number,
            date: r.date.clone(),
            start_time_ms: r.start_time_ms,
            end_time_ms: r.end_time_ms,
            duration_ms: r.duration_ms,
            average_speed_kph: r.average_speed_kph,
            max_speed_kph: r.max_speed_kph,
            completed: r.completed,
            start_checkpoint: r.start_checkpoint.id.clone(),
            finish_checkpoint: r.finish_checkpoint.id.clone(),
        })?;
    }
    w.flush()?;
    Ok(())
}

/// Ghost trajectory of each run with time relative to the first point.
pub fn export_ghost_csv(runs: &[RunRecord], path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record(["Time", "Latitude", "Longitude", "LapNumber", "Course", "Date"])?;
    for r in runs {
        let t0 = r.ghost_path.first().map(|p| p.timestamp_ms).unwrap_or(0);
        for p in &r.ghost_path {
            w.write_record(&[
                format!("{:.3}", p.timestamp_ms.saturating_sub(t0) as f64 / 1000.0),
                format!("{:.7}", p.latitude),
                format!("{:.7}", p.longitude),
                format!("{}", r.lap_number),
                r.course_id.clone(),
                r.date.clone(),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Recorded fixes for replay, one JSON object per line.
pub fn import_fixes_ndjson(path: &Path) -> Result<Vec<LocationFix>> {
    read_ndjson(path)
}

/// Recorded fixes for replay. Empty optional columns read as missing.
pub fn import_fixes_csv(path: &Path) -> Result<Vec<LocationFix>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut fixes = Vec::new();
    for rec in rdr.deserialize() {
        let r: FixRow = rec?;
        fixes.push(LocationFix {
            latitude: r.latitude,
            longitude: r.longitude,
            speed_mps: r.speed_mps,
            heading: r.heading,
            timestamp_ms: r.timestamp_ms,
            accuracy_m: r.accuracy_m,
        });
    }
    Ok(fixes)
}

pub fn export_fixes_csv(fixes: &[LocationFix], path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for f in fixes {
        w.serialize(FixRow {
            timestamp_ms: f.timestamp_ms,
            latitude: f.latitude,
            longitude: f.longitude,
            speed_mps: f.speed_mps,
            heading: f.heading,
            accuracy_m: f.accuracy_m,
        })?;
    }
    w.flush()?;
    Ok(())
}

fn read_ndjson<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rdr = BufReader::new(f);
    let mut out = vec![];
    for (n, line) in rdr.lines().enumerate() {
        let s = line?;
        if s.trim().is_empty() {
            continue;
        }
        let v = serde_json::from_str(&s).with_context(|| format!("{}:{}", path.display(), n + 1))?;
        out.push(v);
    }
    Ok(out)
}

#[derive(Serialize, Deserialize)]
struct RunRow {
    id: String,
    course_id: String,
    lap_number: u32,
    date: String,
    start_time_ms: u64,
    end_time_ms: u64,
    duration_ms: u64,
    average_speed_kph: f64,
    max_speed_kph: f64,
    completed: bool,
    start_checkpoint: String,
    finish_checkpoint: String,
}

#[derive(Serialize, Deserialize)]
struct FixRow {
    timestamp_ms: u64,
    latitude: f64,
    longitude: f64,
    speed_mps: Option<f64>,
    heading: Option<f64>,
    accuracy_m: Option<f64>,
}
