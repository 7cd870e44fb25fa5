pub mod cameras;
pub mod geo;
pub mod ghost;
pub mod history;
pub mod instruction;
pub mod pacenote;
pub mod phrasing;
pub mod random;
pub mod road;

pub use geo::{bearing_deg, distance_m, severity_for_angle, signed_angle_diff};
pub use ghost::{ghost_position, interpolate_position};
pub use history::{best_run_for_course, course_summary, next_lap_number};
pub use instruction::{generate_instruction, instruction_key, meters_to_yards, InstructionInput};
pub use pacenote::{compose_pacenote, render_pacenote, PacenoteInput};
pub use phrasing::{announcement_message, camera_message, speech_params, Cue};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
pub use road::{analyze_road_ahead, detect_upcoming_turns};
