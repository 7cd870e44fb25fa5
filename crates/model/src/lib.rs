use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw fix as delivered by the platform location service.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// meters per second, as reported by the device
    #[serde(default)]
    pub speed_mps: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    pub timestamp_ms: u64,
    /// horizontal accuracy in meters
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct FilteredLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kph: f64,
    pub heading: Option<f64>,
    pub timestamp_ms: u64,
    pub accuracy_m: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointKind {
    Start,
    Finish,
    /// unordered waypoint, ignored by lap timing
    #[serde(rename = "checkpoint")]
    Intermediate,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Checkpoint {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CheckpointKind,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

impl Checkpoint {
    pub fn new(id: &str, kind: CheckpointKind, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            latitude,
            longitude,
            name: format!("{:?}", kind),
        }
    }
}

/// Course identity shared by every lap between the same two checkpoints.
pub fn course_id(start: &Checkpoint, finish: &Checkpoint) -> String {
    format!("{}_{}", start.id, finish.id)
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Left for negative signed angles, right otherwise.
    pub fn from_signed_angle(angle_diff: f64) -> Self {
        if angle_diff < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Left,
    Right,
    Straight,
}

impl TurnKind {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            TurnKind::Left => Some(Direction::Left),
            TurnKind::Right => Some(Direction::Right),
            TurnKind::Straight => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Left => "left",
            TurnKind::Right => "right",
            TurnKind::Straight => "straight",
        }
    }
}

impl From<Direction> for TurnKind {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Left => TurnKind::Left,
            Direction::Right => TurnKind::Right,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RoadSegment {
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: f64,
    pub distance_from_start_m: f64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct UpcomingTurn {
    #[serde(rename = "type")]
    pub kind: TurnKind,
    /// 1 = sharpest, 6 = near straight
    pub severity: u8,
    pub distance_m: f64,
    pub angle: f64,
    pub description: String,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    Straight,
    Turn,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct NavigationInstruction {
    #[serde(rename = "type")]
    pub kind: InstructionKind,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub severity: Option<u8>,
    pub distance_m: f64,
    pub heading: f64,
    #[serde(default)]
    pub rally_pacenote: Option<RallyPacenote>,
    #[serde(default)]
    pub upcoming_turns: Vec<UpcomingTurn>,
    #[serde(default)]
    pub next_turn_description: Option<String>,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CornerType {
    Hairpin,
    Square,
    Acute,
    Kink,
    Chicane,
    Flat,
    Ballistic,
    Absolute,
}

impl CornerType {
    pub fn phrase(&self) -> &'static str {
        match self {
            CornerType::Hairpin => "hairpin",
            CornerType::Square => "square",
            CornerType::Acute => "acute",
            CornerType::Kink => "kink",
            CornerType::Chicane => "chicane",
            CornerType::Flat => "flat",
            CornerType::Ballistic => "ballistic",
            CornerType::Absolute => "absolute",
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PaceModifier {
    Tightens,
    Opens,
    Long,
    Short,
    VeryLong,
    VeryShort,
    Plus,
    Minus,
    TightensOverCrest,
    TightensInto,
    OpensLong,
}

impl PaceModifier {
    pub fn phrase(&self) -> &'static str {
        match self {
            PaceModifier::Tightens => "tightens",
            PaceModifier::Opens => "opens",
            PaceModifier::Long => "long",
            PaceModifier::Short => "short",
            PaceModifier::VeryLong => "very long",
            PaceModifier::VeryShort => "very short",
            PaceModifier::Plus => "plus",
            PaceModifier::Minus => "minus",
            PaceModifier::TightensOverCrest => "tightens over crest",
            PaceModifier::TightensInto => "tightens into",
            PaceModifier::OpensLong => "opens long",
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Crest {
    Crest,
    SmallCrest,
    BigCrest,
    FlatCrest,
    Jump,
    JumpMaybe,
    Brow,
    Bump,
    Dip,
}

impl Crest {
    pub fn phrase(&self) -> &'static str {
        match self {
            Crest::Crest => "crest",
            Crest::SmallCrest => "small crest",
            Crest::BigCrest => "big crest",
            Crest::FlatCrest => "flat crest",
            Crest::Jump => "jump",
            Crest::JumpMaybe => "jump maybe",
            Crest::Brow => "brow",
            Crest::Bump => "bump",
            Crest::Dip => "dip",
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PaceWarning {
    Caution,
    Danger,
    DoubleDanger,
    Care,
    DontCut,
    Cut,
    SmallCut,
    BigCut,
    Slippy,
    Rough,
    VeryRough,
    Narrow,
    VeryNarrow,
}

impl PaceWarning {
    pub fn phrase(&self) -> &'static str {
        match self {
            PaceWarning::Caution => "caution",
            PaceWarning::Danger => "danger",
            PaceWarning::DoubleDanger => "double danger",
            PaceWarning::Care => "care",
            PaceWarning::DontCut => "don't cut",
            PaceWarning::Cut => "cut",
            PaceWarning::SmallCut => "small cut",
            PaceWarning::BigCut => "big cut",
            PaceWarning::Slippy => "slippy",
            PaceWarning::Rough => "rough",
            PaceWarning::VeryRough => "very rough",
            PaceWarning::Narrow => "narrow",
            PaceWarning::VeryNarrow => "very narrow",
        }
    }

    /// Hazard calls spoken before the corner rather than after it.
    pub fn is_leading(&self) -> bool {
        matches!(
            self,
            PaceWarning::Caution | PaceWarning::Danger | PaceWarning::DoubleDanger | PaceWarning::Care
        )
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RallyPacenote {
    pub severity: u8,
    pub direction: Direction,
    #[serde(default)]
    pub corner_type: Option<CornerType>,
    #[serde(default)]
    pub modifier: Option<PaceModifier>,
    #[serde(default)]
    pub crest: Option<Crest>,
    #[serde(default)]
    pub warning: Option<PaceWarning>,
    #[serde(default)]
    pub distance_m: Option<u32>,
    #[serde(default)]
    pub distance_to_next_m: Option<u32>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GhostPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: u64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RunRecord {
    #[serde(with = "uuid::serde::simple")]
    pub id: Uuid,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
    pub duration_ms: u64,
    pub start_checkpoint: Checkpoint,
    pub finish_checkpoint: Checkpoint,
    pub average_speed_kph: f64,
    pub max_speed_kph: f64,
    pub date: String,
    pub course_id: String,
    pub lap_number: u32,
    #[serde(default)]
    pub ghost_path: Vec<GhostPoint>,
    /// false when the run was ended by hand before the finish ring
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Mph,
    #[default]
    Kmh,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMode {
    Off,
    #[default]
    Normal,
    Rally,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct SpeechParams {
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedCameraKind {
    Fixed,
    Mobile,
    RedLight,
    AverageSpeed,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SpeedCamera {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SpeedCameraKind,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed_limit: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_kind_wire_names() {
        let cp = Checkpoint::new("a", CheckpointKind::Intermediate, 1.0, 2.0);
        let v = serde_json::to_value(&cp).unwrap();
        assert_eq!(v["type"], "checkpoint");

        let start: CheckpointKind = serde_json::from_str("\"start\"").unwrap();
        assert_eq!(start, CheckpointKind::Start);
    }

    #[test]
    fn test_pacenote_enums_use_kebab_case() {
        assert_eq!(serde_json::to_value(PaceWarning::DontCut).unwrap(), "dont-cut");
        assert_eq!(serde_json::to_value(PaceModifier::TightensOverCrest).unwrap(), "tightens-over-crest");
        assert_eq!(serde_json::to_value(Crest::SmallCrest).unwrap(), "small-crest");
    }

    #[test]
    fn test_leading_warnings() {
        assert!(PaceWarning::Care.is_leading());
        assert!(PaceWarning::Caution.is_leading());
        assert!(!PaceWarning::DontCut.is_leading());
        assert!(!PaceWarning::VeryNarrow.is_leading());
    }

    #[test]
    fn test_course_id() {
        let s = Checkpoint::new("s1", CheckpointKind::Start, 0.0, 0.0);
        let f = Checkpoint::new("f1", CheckpointKind::Finish, 0.0, 0.0);
        assert_eq!(course_id(&s, &f), "s1_f1");
    }

    #[test]
    fn test_run_record_defaults_completed() {
        let json = r#"{
            "id": "00000000000000000000000000000000",
            "start_time_ms": 0, "end_time_ms": 10, "duration_ms": 10,
            "start_checkpoint": {"id":"s","type":"start","latitude":0.0,"longitude":0.0,"name":"S"},
            "finish_checkpoint": {"id":"f","type":"finish","latitude":0.0,"longitude":0.0,"name":"F"},
            "average_speed_kph": 0.0, "max_speed_kph": 0.0,
            "date": "1970-01-01T00:00:00Z", "course_id": "s_f", "lap_number": 1
        }"#;
        let run: RunRecord = serde_json::from_str(json).unwrap();
        assert!(run.completed);
        assert!(run.ghost_path.is_empty());
    }
}
