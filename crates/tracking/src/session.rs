//! One tracking session: every fix runs to completion through filter, lap
//! timing, navigation, camera checks and road-name throttling before the next
//! one is admitted.

use analysis::geo::{bearing_deg, distance_m};
use analysis::phrasing::{announcement_message, camera_message, speech_params, Cue};
use analysis::{self as an, InstructionInput, RandomSource, StdRandom};
use model::*;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cameras::{CameraAlert, CameraWatch};
use crate::config::TrackingConfig;
use crate::filter::SignalFilter;
use crate::lap::{LapCommand, LapMachine, LapState};
use crate::road_name::RoadNameTracker;
use crate::sinks::{GeocodeError, GeocodedAddress, MemoryRunStore, NullVoice, RunStore, VoiceSink};

/// What happened on one fix.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub location: FilteredLocation,
    pub state: LapState,
    pub elapsed_ms: Option<u64>,
    pub instruction: Option<NavigationInstruction>,
    /// text handed to the voice sink for navigation this tick
    pub announced: Option<String>,
    pub ghost: Option<(f64, f64)>,
    pub nearest_camera: Option<CameraAlert>,
    /// set on the tick that crossed the finish
    pub finished: Option<RunRecord>,
    /// position to reverse geocode, when the throttle allows it
    pub road_lookup: Option<(f64, f64)>,
}

#[derive(Debug, Default)]
struct RunAccumulator {
    course_id: String,
    speed_sum: f64,
    speed_count: u64,
    max_speed_kph: f64,
    ghost_path: Vec<GhostPoint>,
}

impl RunAccumulator {
    fn new(course_id: &str) -> Self {
        Self { course_id: course_id.to_string(), ..Default::default() }
    }

    fn record(&mut self, loc: &FilteredLocation) {
        self.speed_sum += loc.speed_kph;
        self.speed_count += 1;
        self.max_speed_kph = self.max_speed_kph.max(loc.speed_kph);
        self.ghost_path.push(GhostPoint {
            latitude: loc.latitude,
            longitude: loc.longitude,
            timestamp_ms: loc.timestamp_ms,
        });
    }

    fn average_speed_kph(&self) -> f64 {
        if self.speed_count == 0 {
            0.0
        } else {
            self.speed_sum / self.speed_count as f64
        }
    }
}

pub struct TrackingSession {
    config: TrackingConfig,
    start: Checkpoint,
    finish: Checkpoint,
    cameras: Vec<SpeedCamera>,
    filter: SignalFilter,
    lap: LapMachine,
    voice: Box<dyn VoiceSink>,
    store: Box<dyn RunStore>,
    rng: Box<dyn RandomSource>,
    run: Option<RunAccumulator>,
    active_ghost: Vec<GhostPoint>,
    last_announced_key: Option<String>,
    road: RoadNameTracker,
    camera_watch: CameraWatch,
    last_fix_ms: Option<u64>,
}

impl TrackingSession {
    pub fn new(config: TrackingConfig, start: Checkpoint, finish: Checkpoint) -> Self {
        Self {
            config,
            start,
            finish,
            cameras: Vec::new(),
            filter: SignalFilter::new(),
            lap: LapMachine::new(),
            voice: Box::new(NullVoice),
            store: Box::new(MemoryRunStore::new()),
            rng: Box::new(StdRandom::from_entropy()),
            run: None,
            active_ghost: Vec::new(),
            last_announced_key: None,
            road: RoadNameTracker::new(),
            camera_watch: CameraWatch::new(),
            last_fix_ms: None,
        }
    }

    /// Picks the first start and the first finish out of a checkpoint list.
    pub fn from_checkpoints(config: TrackingConfig, checkpoints: &[Checkpoint]) -> Option<Self> {
        let start = checkpoints.iter().find(|c| c.kind == CheckpointKind::Start)?;
        let finish = checkpoints.iter().find(|c| c.kind == CheckpointKind::Finish)?;
        Some(Self::new(config, start.clone(), finish.clone()))
    }

    pub fn with_voice(mut self, voice: impl VoiceSink + 'static) -> Self {
        self.voice = Box::new(voice);
        self
    }

    pub fn with_store(mut self, store: impl RunStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_cameras(mut self, cameras: Vec<SpeedCamera>) -> Self {
        self.cameras = cameras;
        self
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TrackingConfig) {
        self.config = config;
    }

    pub fn state(&self) -> &LapState {
        self.lap.state()
    }

    pub fn course_id(&self) -> String {
        course_id(&self.start, &self.finish)
    }

    pub fn store(&self) -> &dyn RunStore {
        self.store.as_ref()
    }

    pub fn road_name(&self) -> Option<&str> {
        self.road.current()
    }

    pub fn confirm_route(&mut self) -> bool {
        self.lap.confirm_route()
    }

    pub fn retry(&mut self) -> bool {
        self.lap.retry()
    }

    /// Leave the course entirely. An unfinished run is discarded.
    pub fn exit(&mut self) {
        let cmds = self.lap.exit();
        self.execute(cmds, None);
        self.run = None;
    }

    /// Stop the clock by hand. The partial run is stored as not completed.
    pub fn end_run(&mut self, now_ms: u64) -> Option<RunRecord> {
        let finish = self.finish.clone();
        let cmds = self.lap.end_run(now_ms, &finish);
        self.execute(cmds, None)
    }

    pub fn apply_road_name(&mut self, result: Result<Option<GeocodedAddress>, GeocodeError>) {
        self.road.apply(result);
    }

    /// Dead-reckoned position at `now_ms`, from the last filtered fix.
    pub fn extrapolate(&self, now_ms: u64) -> Option<FilteredLocation> {
        let last = self.filter.last()?;
        let dt_s = now_ms.saturating_sub(last.timestamp_ms) as f64 / 1000.0;
        self.filter.predict(dt_s)
    }

    pub fn course_summary(&self) -> Value {
        let id = self.course_id();
        let runs = self.store.runs_for_course(&id).unwrap_or_else(|e| {
            tracing::warn!("load runs for {}: {:#}", id, e);
            Vec::new()
        });
        an::course_summary(&runs, &id)
    }

    /// Process one raw fix. Returns `None` when the fix is stale.
    pub fn on_fix(&mut self, fix: &LocationFix) -> Option<TickReport> {
        if let Some(last) = self.last_fix_ms {
            if fix.timestamp_ms <= last {
                tracing::debug!(ts = fix.timestamp_ms, last, "dropping out-of-order fix");
                return None;
            }
        }
        self.last_fix_ms = Some(fix.timestamp_ms);

        let loc = self.filter.process(fix);
        if self.lap.is_running() {
            if let Some(run) = self.run.as_mut() {
                run.record(&loc);
            }
        }

        let cmds = self.lap.on_position(&loc, &self.start, &self.finish);
        // the start cue gets this tick to itself
        let started = cmds.contains(&LapCommand::AnnounceStart);
        let finished = self.execute(cmds, Some(fix));
        // a run start re-primes the filter with this fix
        let loc = self.filter.last().cloned().unwrap_or(loc);

        let running = self.lap.is_running();
        let elapsed_ms = self.lap.elapsed_ms(loc.timestamp_ms);

        let (instruction, announced) = match (running, loc.heading) {
            (true, Some(heading)) if !started => {
                let (ins, msg) = self.navigate(&loc, heading);
                (Some(ins), msg)
            }
            _ => (None, None),
        };

        let cams = self.camera_watch.check(&loc, &self.cameras, running && !started);
        for (_, band) in &cams.announce {
            if let Some(params) = speech_params(Cue::Camera, self.config.voice_mode, self.config.navigation_volume) {
                self.voice.stop();
                self.voice.speak(&camera_message(self.config.voice_mode, *band), params);
            }
        }

        let ghost = match elapsed_ms {
            Some(elapsed) if self.config.ghost_enabled => an::ghost_position(&self.active_ghost, elapsed),
            _ => None,
        };

        let road_lookup = if self.road.should_lookup(fix.timestamp_ms, fix.latitude, fix.longitude) {
            self.road.mark_requested(fix.timestamp_ms, fix.latitude, fix.longitude);
            Some((fix.latitude, fix.longitude))
        } else {
            None
        };

        Some(TickReport {
            location: loc,
            state: self.lap.state().clone(),
            elapsed_ms,
            instruction,
            announced,
            ghost,
            nearest_camera: cams.nearest,
            finished,
            road_lookup,
        })
    }

    fn navigate(&mut self, loc: &FilteredLocation, heading: f64) -> (NavigationInstruction, Option<String>) {
        let rally = self.config.is_rally();
        let (flat, flon) = (self.finish.latitude, self.finish.longitude);

        let segments = an::analyze_road_ahead(loc.latitude, loc.longitude, flat, flon, rally);
        let upcoming = an::detect_upcoming_turns(&segments, heading, rally);
        let instruction = an::generate_instruction(
            &InstructionInput {
                heading,
                target_bearing: bearing_deg(loc.latitude, loc.longitude, flat, flon),
                distance_m: distance_m(loc.latitude, loc.longitude, flat, flon),
                speed_kph: loc.speed_kph,
                upcoming: &upcoming,
            },
            self.config.unit_system,
            self.rng.as_mut(),
        );

        let key = an::instruction_key(&instruction);
        if self.last_announced_key.as_deref() == Some(key.as_str()) {
            return (instruction, None);
        }
        let params = match speech_params(Cue::Navigation, self.config.voice_mode, self.config.navigation_volume) {
            Some(p) => p,
            None => return (instruction, None),
        };

        let message = announcement_message(
            &instruction,
            self.config.voice_mode,
            self.config.unit_system,
            loc.speed_kph,
            self.rng.as_mut(),
        )
        .filter(|m| !m.is_empty());
        self.last_announced_key = Some(key);

        if let Some(msg) = &message {
            tracing::debug!(message = %msg, "navigation");
            self.voice.stop();
            self.voice.speak(msg, params);
        }
        (instruction, message)
    }

    fn say(&mut self, cue: Cue, message: &str) {
        if let Some(params) = speech_params(cue, self.config.voice_mode, self.config.navigation_volume) {
            self.voice.speak(message, params);
        }
    }

    fn execute(&mut self, cmds: Vec<LapCommand>, fix: Option<&LocationFix>) -> Option<RunRecord> {
        let mut finished = None;
        for cmd in cmds {
            match cmd {
                LapCommand::ResetFilters => {
                    self.filter.reset();
                    if let Some(f) = fix {
                        self.filter.process(f);
                    }
                }
                LapCommand::BeginRun { course_id, .. } => self.begin_run(&course_id),
                LapCommand::AnnounceStart => self.say(Cue::Start, "Start"),
                LapCommand::StopSpeech => self.voice.stop(),
                LapCommand::AnnounceFinish => self.say(Cue::Finish, "Finish"),
                LapCommand::FinalizeRun { start, finish, start_ms, end_ms, completed } => {
                    finished = self.finalize_run(start, finish, start_ms, end_ms, completed);
                }
                LapCommand::ClearNavigation => {
                    self.last_announced_key = None;
                    self.active_ghost.clear();
                    self.camera_watch.clear();
                }
            }
        }
        finished
    }

    fn begin_run(&mut self, course_id: &str) {
        let mut run = RunAccumulator::new(course_id);
        if let Some(loc) = self.filter.last() {
            run.record(loc);
        }
        self.run = Some(run);
        self.last_announced_key = None;
        self.camera_watch.clear();

        self.active_ghost.clear();
        if self.config.ghost_enabled {
            match self.store.runs_for_course(course_id) {
                Ok(runs) => {
                    if let Some(best) = an::best_run_for_course(&runs, course_id) {
                        tracing::info!(best_ms = best.duration_ms, "loaded ghost from best run");
                        self.active_ghost = best.ghost_path.clone();
                    }
                }
                Err(e) => tracing::warn!("load ghost for {}: {:#}", course_id, e),
            }
        }
    }

    fn finalize_run(
        &mut self,
        start: Checkpoint,
        finish: Checkpoint,
        start_ms: u64,
        end_ms: u64,
        completed: bool,
    ) -> Option<RunRecord> {
        let run = self.run.take()?;
        let lap_number = match self.store.runs_for_course(&run.course_id) {
            Ok(runs) => an::next_lap_number(&runs, &run.course_id),
            Err(e) => {
                tracing::warn!("count laps for {}: {:#}", run.course_id, e);
                1
            }
        };

        let record = RunRecord {
            id: Uuid::new_v4(),
            start_time_ms: start_ms,
            end_time_ms: end_ms,
            duration_ms: end_ms.saturating_sub(start_ms),
            start_checkpoint: start,
            finish_checkpoint: finish,
            average_speed_kph: run.average_speed_kph(),
            max_speed_kph: run.max_speed_kph,
            date: format_date(end_ms),
            course_id: run.course_id,
            lap_number,
            ghost_path: run.ghost_path,
            completed,
        };
        tracing::info!(
            duration_ms = record.duration_ms,
            lap = record.lap_number,
            completed,
            "run finalized"
        );

        if let Err(e) = self.store.save_run(record.clone()) {
            tracing::warn!("save run {}: {:#}", record.id, e);
        }
        Some(record)
    }
}

fn format_date(epoch_ms: u64) -> String {
    let at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000)
        .unwrap_or_else(|_| OffsetDateTime::now_utc());
    at.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis::ScriptedRandom;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_date(1_700_000_000_000), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_from_checkpoints_needs_both_ends() {
        let s = Checkpoint::new("s", CheckpointKind::Start, 0.0, 0.0);
        let f = Checkpoint::new("f", CheckpointKind::Finish, 0.0, 0.01);
        assert!(TrackingSession::from_checkpoints(TrackingConfig::default(), &[s.clone()]).is_none());
        let sess = TrackingSession::from_checkpoints(TrackingConfig::default(), &[f, s])
            .unwrap()
            .with_random(ScriptedRandom::constant(0.5));
        assert_eq!(sess.course_id(), "s_f");
    }

    #[test]
    fn test_stale_fix_dropped() {
        let s = Checkpoint::new("s", CheckpointKind::Start, 0.0, 0.0);
        let f = Checkpoint::new("f", CheckpointKind::Finish, 0.0, 0.01);
        let mut sess = TrackingSession::new(TrackingConfig::default(), s, f);
        let fix = LocationFix {
            latitude: 0.0,
            longitude: 0.005,
            speed_mps: None,
            heading: None,
            timestamp_ms: 1_000,
            accuracy_m: None,
        };
        assert!(sess.on_fix(&fix).is_some());
        assert!(sess.on_fix(&fix).is_none());
        let older = LocationFix { timestamp_ms: 500, ..fix };
        assert!(sess.on_fix(&older).is_none());
    }
}
