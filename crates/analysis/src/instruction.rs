use model::*;

use crate::geo::{severity_for_angle, signed_angle_diff};
use crate::pacenote::{compose_pacenote, PacenoteInput};
use crate::random::RandomSource;
use crate::road::ROAD_LOOKAHEAD_M;

/// Heading changes under this are announced as "straight".
pub const STRAIGHT_TOLERANCE_DEG: f64 = 10.0;
const DEDUP_BUCKET_M: f64 = 50.0;

pub fn meters_to_yards(meters: f64) -> u64 {
    (meters * 1.09361).round().max(0.0) as u64
}

/// Integer distance and unit word for speech.
pub fn spoken_distance(meters: f64, units: UnitSystem) -> (u64, &'static str) {
    match units {
        UnitSystem::Mph => (meters_to_yards(meters), "yards"),
        UnitSystem::Kmh => (meters.round().max(0.0) as u64, "meters"),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InstructionInput<'a> {
    pub heading: f64,
    pub target_bearing: f64,
    pub distance_m: f64,
    pub speed_kph: f64,
    pub upcoming: &'a [UpcomingTurn],
}

pub fn generate_instruction(
    input: &InstructionInput<'_>,
    units: UnitSystem,
    rng: &mut dyn RandomSource,
) -> NavigationInstruction {
    let angle_diff = signed_angle_diff(input.heading, input.target_bearing);
    let abs_angle = angle_diff.abs();

    if abs_angle < STRAIGHT_TOLERANCE_DEG {
        return NavigationInstruction {
            kind: InstructionKind::Straight,
            direction: None,
            severity: None,
            distance_m: input.distance_m,
            heading: input.heading,
            rally_pacenote: None,
            upcoming_turns: Vec::new(),
            next_turn_description: None,
        };
    }

    let direction = Direction::from_signed_angle(angle_diff);
    let severity = severity_for_angle(abs_angle);

    // composed regardless of voice mode
    let pacenote = compose_pacenote(
        &PacenoteInput {
            severity,
            direction,
            abs_angle,
            distance_m: input.distance_m,
            speed_kph: input.speed_kph,
            upcoming: input.upcoming,
        },
        rng,
    );

    NavigationInstruction {
        kind: InstructionKind::Turn,
        direction: Some(direction),
        severity: Some(severity),
        distance_m: input.distance_m,
        heading: input.heading,
        rally_pacenote: Some(pacenote),
        upcoming_turns: input.upcoming.to_vec(),
        next_turn_description: input.upcoming.first().and_then(|t| next_turn_description(t, units)),
    }
}

fn next_turn_description(turn: &UpcomingTurn, units: UnitSystem) -> Option<String> {
    if turn.distance_m >= ROAD_LOOKAHEAD_M {
        return None;
    }
    let (value, unit) = spoken_distance(turn.distance_m, units);
    let kind = turn.kind.as_str();
    let text = if turn.angle >= 150.0 {
        format!("Take the next {} in {} {}", kind, value, unit)
    } else if turn.angle >= 90.0 {
        format!("Turn {} in {} {}", kind, value, unit)
    } else {
        format!("Bear {} in {} {}", kind, value, unit)
    };
    Some(text)
}

/// Fingerprint used to suppress repeated announcements of the same instruction.
pub fn instruction_key(instruction: &NavigationInstruction) -> String {
    match instruction.kind {
        InstructionKind::Straight => "straight".to_string(),
        InstructionKind::Turn => {
            if let Some(desc) = &instruction.next_turn_description {
                return desc.clone();
            }
            match (instruction.direction, instruction.severity) {
                (Some(dir), Some(sev)) => {
                    let bucket = (instruction.distance_m / DEDUP_BUCKET_M).round() * DEDUP_BUCKET_M;
                    format!("{}_{}_{}", dir.as_str(), sev, bucket as i64)
                }
                _ => "unknown".to_string(),
            }
        }
    }
}
