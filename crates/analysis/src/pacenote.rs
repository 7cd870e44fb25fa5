//! Rally co-driver pacenotes.
//!
//! Corner classification, distance bands and speed warnings are deterministic.
//! Crests and the fallback modifiers are drawn from a [`RandomSource`] so the
//! same corner is not always called the same way.

use model::*;

use crate::random::RandomSource;

const CREST_OPTIONS: [Crest; 4] = [Crest::Crest, Crest::SmallCrest, Crest::Brow, Crest::Dip];
const LINK_DISTANCE_M: f64 = 100.0;
const SPOKEN_DISTANCE_MIN_M: u32 = 60;

#[derive(Clone, Copy, Debug)]
pub struct PacenoteInput<'a> {
    pub severity: u8,
    pub direction: Direction,
    pub abs_angle: f64,
    pub distance_m: f64,
    pub speed_kph: f64,
    pub upcoming: &'a [UpcomingTurn],
}

pub fn classify_corner(severity: u8, abs_angle: f64, speed_kph: f64) -> Option<CornerType> {
    let mut corner = if abs_angle >= 150.0 {
        Some(CornerType::Hairpin)
    } else if (85.0..=95.0).contains(&abs_angle) {
        Some(CornerType::Square)
    } else if abs_angle > 95.0 {
        Some(CornerType::Acute)
    } else if abs_angle < 18.0 {
        Some(CornerType::Kink)
    } else {
        None
    };

    if severity == 6 && abs_angle < 25.0 {
        if speed_kph > 90.0 {
            corner = Some(CornerType::Flat);
        } else if speed_kph > 70.0 {
            corner = Some(CornerType::Ballistic);
        }
    }
    corner
}

/// Length call for the corner distance. The bands are checked long-first, so
/// anything under 50 m is called "short".
pub fn distance_modifier(distance_m: f64) -> Option<PaceModifier> {
    if distance_m > 200.0 && distance_m < 400.0 {
        Some(PaceModifier::Long)
    } else if distance_m > 400.0 {
        Some(PaceModifier::VeryLong)
    } else if distance_m < 50.0 {
        Some(PaceModifier::Short)
    } else if distance_m < 30.0 {
        Some(PaceModifier::VeryShort)
    } else {
        None
    }
}

pub fn speed_warning(severity: u8, speed_kph: f64) -> Option<PaceWarning> {
    if speed_kph > 85.0 && severity <= 3 {
        Some(PaceWarning::DontCut)
    } else if speed_kph > 100.0 && severity <= 4 {
        Some(PaceWarning::Care)
    } else {
        None
    }
}

pub fn compose_pacenote(input: &PacenoteInput<'_>, rng: &mut dyn RandomSource) -> RallyPacenote {
    let severity = input.severity;
    let mut note = RallyPacenote {
        severity,
        direction: input.direction,
        corner_type: classify_corner(severity, input.abs_angle, input.speed_kph),
        modifier: None,
        crest: None,
        warning: None,
        distance_m: None,
        distance_to_next_m: None,
    };

    // first candidate wins
    let mut modifiers: Vec<PaceModifier> = Vec::with_capacity(3);
    if let Some(m) = distance_modifier(input.distance_m) {
        modifiers.push(m);
    }
    let mut warning = speed_warning(severity, input.speed_kph);

    let crest_chance = if severity <= 3 { 0.25 } else { 0.15 };
    if rng.next() < crest_chance {
        let idx = ((rng.next() * CREST_OPTIONS.len() as f64) as usize).min(CREST_OPTIONS.len() - 1);
        let crest = CREST_OPTIONS[idx];
        note.crest = Some(crest);
        if matches!(crest, Crest::Crest | Crest::SmallCrest) && severity <= 3 {
            modifiers.push(PaceModifier::TightensOverCrest);
        }
    }

    if let Some(next) = input.upcoming.get(1) {
        let to_next = next.distance_m - input.distance_m;
        if to_next > 0.0 && to_next < LINK_DISTANCE_M {
            note.distance_to_next_m = Some(to_next.round() as u32);
            if next.severity < severity {
                modifiers.push(PaceModifier::TightensInto);
            } else if next.severity > severity {
                modifiers.push(PaceModifier::Opens);
            }
        }
    }

    if severity <= 3
        && !modifiers.contains(&PaceModifier::TightensOverCrest)
        && !modifiers.contains(&PaceModifier::TightensInto)
    {
        if rng.next() > 0.65 {
            modifiers.push(PaceModifier::Tightens);
        }
    } else if severity >= 5 && modifiers.is_empty() && rng.next() > 0.7 {
        modifiers.push(PaceModifier::OpensLong);
    }

    if severity <= 2 && rng.next() > 0.8 {
        warning = Some(PaceWarning::Caution);
    }

    note.modifier = modifiers.first().copied();
    note.warning = warning;
    note.distance_m = Some(input.distance_m.max(0.0).round() as u32);
    note
}

/// Spoken form, e.g. `"150, crest, 3 left, tightens, don't cut"`.
pub fn render_pacenote(note: &RallyPacenote, next: Option<&RallyPacenote>) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(8);

    if let Some(d) = note.distance_m {
        if d > SPOKEN_DISTANCE_MIN_M {
            parts.push(d.to_string());
        }
    }
    if let Some(c) = note.crest {
        parts.push(c.phrase().into());
    }
    if let Some(w) = note.warning.filter(|w| w.is_leading()) {
        parts.push(w.phrase().into());
    }
    if let Some(c) = note.corner_type {
        parts.push(c.phrase().into());
    }
    parts.push(format!("{} {}", note.severity, note.direction.as_str()));
    if let Some(m) = note.modifier {
        parts.push(m.phrase().into());
    }
    if let Some(w) = note.warning.filter(|w| !w.is_leading()) {
        parts.push(w.phrase().into());
    }
    if let (Some(next), Some(gap)) = (next, note.distance_to_next_m) {
        if gap > 0 && (gap as f64) < LINK_DISTANCE_M {
            parts.push(format!("into {} {}", next.severity, next.direction.as_str()));
        }
    }

    parts.join(", ")
}
