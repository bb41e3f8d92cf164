//! Core race simulation shared by the server and the tests.
//!
//! Two independent engines live here: [`CircuitRace`], a single car lapping
//! an implicit circular track, and [`DragRace`], two racers on a straight
//! strip heading for a finish line. Both are plain state machines with no I/O:
//! the caller owns the state, supplies timestamps and elapsed time, and reads
//! results back through accessors.

pub mod circuit;
pub mod drag;
pub mod error;
pub mod input;
pub mod math;

pub use circuit::{CircuitConfig, CircuitRace};
pub use drag::{DragConfig, DragRace, Racer, TieBreak, Winner};
pub use error::RaceError;
pub use input::KeySet;

pub const CIRCUIT_START: (f32, f32, f32) = (10.0, 1.0, 0.0);
pub const DRAG_START_X: f32 = -10.0;
pub const DRAG_LANE_A_Z: f32 = 2.0;
pub const DRAG_LANE_B_Z: f32 = -2.0;
pub const RIDE_HEIGHT: f32 = 1.0;

pub const BASE_SPEED: f32 = 15.0;
pub const TURN_SPEED: f32 = 3.0;
pub const COAST_DECAY: f32 = 0.95;
pub const REVERSE_FACTOR: f32 = 0.5;

pub const DRAG_ACCELERATION: f32 = 15.0;
pub const DRAG_BRAKE_FACTOR: f32 = 2.0;
pub const DRAG_MAX_SPEED: f32 = 30.0;
pub const DRAG_FRICTION: f32 = 0.95;
pub const FINISH_LINE_X: f32 = 20.0;

pub const DEFAULT_TOTAL_LAPS: i32 = 3;

/// Behaviour common to both race variants.
///
/// `now` is a millisecond timestamp from a clock that is monotonic for the
/// lifetime of one race; only differences against the start time are used.
/// `delta` is the elapsed simulated time in seconds since the previous tick.
pub trait Race {
    fn start(&mut self, now: f64);

    fn update(&mut self, delta: f32, now: f64, keys: &KeySet) -> Result<(), RaceError>;

    fn is_started(&self) -> bool;

    fn is_completed(&self) -> bool;

    /// Seconds elapsed between `start` and the last applied tick.
    fn current_time(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive<R: Race>(race: &mut R, ticks: u32, keys: &KeySet) {
        race.start(0.0);
        for i in 1..=ticks {
            race.update(0.1, i as f64 * 100.0, keys).unwrap();
        }
    }

    #[test]
    fn test_trait_drives_both_variants() {
        let mut circuit = CircuitRace::with_laps(3).unwrap();
        let mut drag = DragRace::default();

        drive(&mut circuit, 5, &KeySet::from_keys(["KeyW"]));
        drive(&mut drag, 5, &KeySet::from_keys(["KeyW"]));

        assert!(circuit.is_started());
        assert!(drag.is_started());
        assert_eq!(circuit.current_time(), 0.5);
        assert_eq!(drag.current_time(), 0.5);
    }

    #[test]
    fn test_start_positions() {
        let circuit = CircuitRace::with_laps(1).unwrap();
        assert_eq!(circuit.position(), CIRCUIT_START);

        let drag = DragRace::default();
        assert_eq!(drag.racer_a().position(), (DRAG_START_X, RIDE_HEIGHT, DRAG_LANE_A_Z));
        assert_eq!(drag.racer_b().position(), (DRAG_START_X, RIDE_HEIGHT, DRAG_LANE_B_Z));
    }
}
