//! Spoken text and voice parameters for every kind of announcement.

use model::*;

use crate::instruction::spoken_distance;
use crate::pacenote::{compose_pacenote, render_pacenote, PacenoteInput};
use crate::random::RandomSource;

const SHORT_STRAIGHT_CALLS: [&str; 3] = ["flat", "stay middle", "full commit"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Start,
    Finish,
    Navigation,
    Camera,
}

/// Voice parameters for a cue, or `None` when nothing should be spoken.
pub fn speech_params(cue: Cue, mode: VoiceMode, volume_pct: u8) -> Option<SpeechParams> {
    if mode == VoiceMode::Off || volume_pct == 0 {
        return None;
    }
    let rally = mode == VoiceMode::Rally;
    let (pitch, rate) = match cue {
        Cue::Start => (1.0, 0.9),
        Cue::Finish => (1.1, 0.8),
        Cue::Navigation if rally => (1.1, 1.25),
        Cue::Navigation => (1.0, 0.9),
        Cue::Camera if rally => (1.05, 1.1),
        Cue::Camera => (1.0, 0.85),
    };
    Some(SpeechParams {
        pitch,
        rate,
        volume: f32::from(volume_pct.min(100)) / 100.0,
    })
}

pub fn announcement_message(
    instruction: &NavigationInstruction,
    mode: VoiceMode,
    units: UnitSystem,
    speed_kph: f64,
    rng: &mut dyn RandomSource,
) -> Option<String> {
    match mode {
        VoiceMode::Off => None,
        VoiceMode::Rally => rally_message(instruction, speed_kph, rng),
        VoiceMode::Normal => Some(normal_message(instruction, units)),
    }
}

fn rally_message(instruction: &NavigationInstruction, speed_kph: f64, rng: &mut dyn RandomSource) -> Option<String> {
    match instruction.kind {
        InstructionKind::Straight => {
            let d = instruction.distance_m;
            let msg = if d > 500.0 {
                "flat out, long straight"
            } else if d > 200.0 {
                "keep in it"
            } else {
                let idx = ((rng.next() * SHORT_STRAIGHT_CALLS.len() as f64) as usize).min(SHORT_STRAIGHT_CALLS.len() - 1);
                SHORT_STRAIGHT_CALLS[idx]
            };
            Some(msg.to_string())
        }
        InstructionKind::Turn => {
            let note = instruction.rally_pacenote.as_ref()?;
            let next = instruction.upcoming_turns.get(1).and_then(|t| {
                let direction = t.kind.direction()?;
                Some(compose_pacenote(
                    &PacenoteInput {
                        severity: t.severity,
                        direction,
                        abs_angle: t.angle,
                        distance_m: t.distance_m,
                        speed_kph,
                        upcoming: &[],
                    },
                    rng,
                ))
            });
            Some(render_pacenote(note, next.as_ref()))
        }
    }
}

fn normal_message(instruction: &NavigationInstruction, units: UnitSystem) -> String {
    if let Some(desc) = &instruction.next_turn_description {
        return desc.clone();
    }
    let d = instruction.distance_m;
    match (instruction.kind, instruction.direction) {
        (InstructionKind::Straight, _) => {
            if d > 500.0 {
                let (value, unit) = spoken_distance(d, units);
                format!("Continue straight for {} {}", value, unit)
            } else {
                "Continue straight ahead".to_string()
            }
        }
        (InstructionKind::Turn, Some(dir)) => {
            if d < 100.0 {
                format!("Turn {} ahead", dir.as_str())
            } else {
                let (value, unit) = spoken_distance(d, units);
                format!("Turn {} in {} {}", dir.as_str(), value, unit)
            }
        }
        (InstructionKind::Turn, None) => String::new(),
    }
}

pub fn camera_message(mode: VoiceMode, band_m: u32) -> String {
    match mode {
        VoiceMode::Rally => format!("Caution, speed camera {} meters", band_m),
        _ => format!("Speed camera ahead in {} meters", band_m),
    }
}
