//! Checkpoint lap timing.
//!
//! The machine is pure: each call returns the commands the session must carry
//! out (speech, persistence, filter resets) instead of doing any I/O itself.

use analysis::geo::distance_m;
use model::{course_id, Checkpoint, FilteredLocation};

/// Radius of the start and finish rings.
pub const PROXIMITY_THRESHOLD_M: f64 = 5.0;
/// Distance from the finish that must be exceeded before the course can be re-armed.
pub const FINISH_EXIT_THRESHOLD_M: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub enum LapState {
    Idle,
    /// Route confirmed, waiting for the start ring.
    Armed,
    Running { start_ms: u64, start_checkpoint: Checkpoint },
    Finished { elapsed_ms: u64, left_finish: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub enum LapCommand {
    ResetFilters,
    BeginRun { course_id: String, start_ms: u64 },
    AnnounceStart,
    StopSpeech,
    AnnounceFinish,
    FinalizeRun {
        start: Checkpoint,
        finish: Checkpoint,
        start_ms: u64,
        end_ms: u64,
        completed: bool,
    },
    ClearNavigation,
}

#[derive(Clone, Debug)]
pub struct LapMachine {
    state: LapState,
    start_latch: bool,
}

impl Default for LapMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LapMachine {
    pub fn new() -> Self {
        Self { state: LapState::Idle, start_latch: false }
    }

    pub fn state(&self) -> &LapState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LapState::Running { .. })
    }

    /// Elapsed time of the current run, if any.
    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        match &self.state {
            LapState::Running { start_ms, .. } => Some(now_ms.saturating_sub(*start_ms)),
            _ => None,
        }
    }

    /// The user pressed start. From Finished this only works after the driver left the finish area.
    pub fn confirm_route(&mut self) -> bool {
        match self.state {
            LapState::Idle | LapState::Finished { left_finish: true, .. } => {
                tracing::info!(from = ?self.state, "route confirmed, armed");
                self.state = LapState::Armed;
                true
            }
            _ => false,
        }
    }

    /// Retry from the finish screen.
    pub fn retry(&mut self) -> bool {
        if let LapState::Finished { .. } = self.state {
            self.state = LapState::Armed;
            true
        } else {
            false
        }
    }

    pub fn exit(&mut self) -> Vec<LapCommand> {
        let was_running = self.is_running();
        self.state = LapState::Idle;
        self.start_latch = false;
        if was_running {
            vec![LapCommand::StopSpeech, LapCommand::ClearNavigation]
        } else {
            Vec::new()
        }
    }

    /// Manual "End Run".
    pub fn end_run(&mut self, now_ms: u64, finish: &Checkpoint) -> Vec<LapCommand> {
        let (start_ms, start) = match &self.state {
            LapState::Running { start_ms, start_checkpoint } => (*start_ms, start_checkpoint.clone()),
            _ => return Vec::new(),
        };
        let elapsed_ms = now_ms.saturating_sub(start_ms);
        tracing::info!(elapsed_ms, "run ended by hand");
        // the start latch stays set until the driver leaves the start ring
        self.state = LapState::Finished { elapsed_ms, left_finish: true };
        vec![
            LapCommand::StopSpeech,
            LapCommand::FinalizeRun {
                start,
                finish: finish.clone(),
                start_ms,
                end_ms: now_ms,
                completed: false,
            },
            LapCommand::ClearNavigation,
        ]
    }

    /// Feed one filtered fix. At most one transition fires per call.
    pub fn on_position(&mut self, loc: &FilteredLocation, start: &Checkpoint, finish: &Checkpoint) -> Vec<LapCommand> {
        let to_start = distance_m(loc.latitude, loc.longitude, start.latitude, start.longitude);
        let to_finish = distance_m(loc.latitude, loc.longitude, finish.latitude, finish.longitude);
        let in_start = to_start <= PROXIMITY_THRESHOLD_M;

        if !in_start && self.start_latch && !self.is_running() {
            tracing::debug!(to_start, "left start ring, latch cleared");
            self.start_latch = false;
        }

        match &mut self.state {
            LapState::Finished { left_finish, .. } => {
                if !*left_finish && to_finish > FINISH_EXIT_THRESHOLD_M {
                    tracing::debug!(to_finish, "left finish area");
                    *left_finish = true;
                }
                Vec::new()
            }
            LapState::Armed if in_start && !self.start_latch => {
                let start_ms = loc.timestamp_ms;
                tracing::info!(start_ms, checkpoint = %start.id, "run started");
                self.state = LapState::Running { start_ms, start_checkpoint: start.clone() };
                self.start_latch = true;
                vec![
                    LapCommand::ResetFilters,
                    LapCommand::BeginRun { course_id: course_id(start, finish), start_ms },
                    LapCommand::StopSpeech,
                    LapCommand::AnnounceStart,
                ]
            }
            LapState::Running { start_ms, start_checkpoint } if to_finish <= PROXIMITY_THRESHOLD_M => {
                let start_ms = *start_ms;
                let start = start_checkpoint.clone();
                let end_ms = loc.timestamp_ms;
                let elapsed_ms = end_ms.saturating_sub(start_ms);
                tracing::info!(elapsed_ms, checkpoint = %finish.id, "run finished");
                self.state = LapState::Finished { elapsed_ms, left_finish: false };
                self.start_latch = false;
                vec![
                    LapCommand::StopSpeech,
                    LapCommand::AnnounceFinish,
                    LapCommand::FinalizeRun {
                        start,
                        finish: finish.clone(),
                        start_ms,
                        end_ms,
                        completed: true,
                    },
                    LapCommand::ClearNavigation,
                ]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::CheckpointKind;

    // ~1.1km apart along a meridian
    fn checkpoints() -> (Checkpoint, Checkpoint) {
        (
            Checkpoint::new("s", CheckpointKind::Start, 45.0, 7.0),
            Checkpoint::new("f", CheckpointKind::Finish, 45.01, 7.0),
        )
    }

    fn at(lat: f64, ts: u64) -> FilteredLocation {
        FilteredLocation {
            latitude: lat,
            longitude: 7.0,
            speed_kph: 50.0,
            heading: Some(0.0),
            timestamp_ms: ts,
            accuracy_m: 5.0,
        }
    }

    #[test]
    fn test_idle_ignores_start_ring() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        assert!(m.on_position(&at(45.0, 0), &s, &f).is_empty());
        assert_eq!(m.state(), &LapState::Idle);
    }

    #[test]
    fn test_start_and_finish() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        assert!(m.confirm_route());

        let cmds = m.on_position(&at(45.0, 1_000), &s, &f);
        assert_eq!(cmds[0], LapCommand::ResetFilters);
        let stop = cmds.iter().position(|c| *c == LapCommand::StopSpeech).unwrap();
        let announce = cmds.iter().position(|c| *c == LapCommand::AnnounceStart).unwrap();
        assert!(stop < announce);
        assert!(m.is_running());
        assert_eq!(m.elapsed_ms(4_000), Some(3_000));

        assert!(m.on_position(&at(45.005, 5_000), &s, &f).is_empty());

        let cmds = m.on_position(&at(45.01, 13_400), &s, &f);
        assert!(cmds.iter().any(|c| matches!(
            c,
            LapCommand::FinalizeRun { start_ms: 1_000, end_ms: 13_400, completed: true, .. }
        )));
        assert_eq!(m.state(), &LapState::Finished { elapsed_ms: 12_400, left_finish: false });
    }

    #[test]
    fn test_finish_fires_once_while_stationary() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        m.confirm_route();
        m.on_position(&at(45.0, 0), &s, &f);

        let mut finishes = 0;
        for i in 0..20 {
            let cmds = m.on_position(&at(45.01, 10_000 + i * 100), &s, &f);
            finishes += cmds.iter().filter(|c| matches!(c, LapCommand::AnnounceFinish)).count();
        }
        assert_eq!(finishes, 1);
    }

    #[test]
    fn test_finish_before_start_ignored() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        m.confirm_route();
        assert!(m.on_position(&at(45.01, 0), &s, &f).is_empty());
        assert_eq!(m.state(), &LapState::Armed);
    }

    #[test]
    fn test_rearm_requires_leaving_finish() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        m.confirm_route();
        m.on_position(&at(45.0, 0), &s, &f);
        m.on_position(&at(45.01, 10_000), &s, &f);

        // still next to the finish
        assert!(!m.confirm_route());
        m.on_position(&at(45.0102, 11_000), &s, &f);
        assert!(!m.confirm_route());

        // >50m away
        m.on_position(&at(45.0095, 12_000), &s, &f);
        assert!(m.confirm_route());

        let mut starts = 0;
        for i in 0..5 {
            let cmds = m.on_position(&at(45.0, 20_000 + i * 100), &s, &f);
            starts += cmds.iter().filter(|c| matches!(c, LapCommand::AnnounceStart)).count();
        }
        assert_eq!(starts, 1);
        assert!(m.is_running());
    }

    #[test]
    fn test_start_latch_needs_exit_from_ring() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        m.confirm_route();
        m.on_position(&at(45.0, 0), &s, &f);
        m.end_run(2_000, &f);
        assert!(m.confirm_route());

        // still sitting on the start line: latch holds
        assert!(m.on_position(&at(45.0, 3_000), &s, &f).is_empty());
        m.on_position(&at(45.0002, 4_000), &s, &f);
        let cmds = m.on_position(&at(45.0, 5_000), &s, &f);
        assert!(cmds.contains(&LapCommand::AnnounceStart));
    }

    #[test]
    fn test_end_run_manual() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        assert!(m.end_run(1_000, &f).is_empty());

        m.confirm_route();
        m.on_position(&at(45.0, 1_000), &s, &f);
        let cmds = m.end_run(6_000, &f);
        assert!(cmds.iter().any(|c| matches!(c, LapCommand::FinalizeRun { completed: false, end_ms: 6_000, .. })));
        assert_eq!(m.state(), &LapState::Finished { elapsed_ms: 5_000, left_finish: true });
    }

    #[test]
    fn test_retry_and_exit() {
        let (s, f) = checkpoints();
        let mut m = LapMachine::new();
        assert!(!m.retry());
        m.confirm_route();
        m.on_position(&at(45.0, 0), &s, &f);
        m.on_position(&at(45.01, 9_000), &s, &f);
        assert!(m.retry());
        assert_eq!(m.state(), &LapState::Armed);
        m.exit();
        assert_eq!(m.state(), &LapState::Idle);
    }
}
