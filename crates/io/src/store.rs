use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use model::RunRecord;
use timeattack_tracking::RunStore;

/// Run history kept as an append-only NDJSON file.
#[derive(Debug, Clone)]
pub struct NdjsonRunStore {
    path: PathBuf,
}

impl NdjsonRunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored run; a missing file is an empty history.
    pub fn all_runs(&self) -> Result<Vec<RunRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        crate::import_runs_ndjson(&self.path)
    }
}

impl RunStore for NdjsonRunStore {
    fn runs_for_course(&self, course_id: &str) -> Result<Vec<RunRecord>> {
        Ok(self.all_runs()?.into_iter().filter(|r| r.course_id == course_id).collect())
    }

    fn save_run(&mut self, record: RunRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        let s = serde_json::to_string(&record)?;
        writeln!(f, "{}", s)?;
        tracing::debug!(run = %record.id, course = %record.course_id, "run appended");
        Ok(())
    }
}
