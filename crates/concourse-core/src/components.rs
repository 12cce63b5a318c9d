//! Pedestrian components and archived runs.

use concourse_logic::grid::Cell;
use serde::{Deserialize, Serialize};

use crate::fields::FieldId;

/// Default per-tick movement radius in cells.
pub const DEFAULT_MOVEMENT: i32 = 3;

/// EWMA decay constant; averages over roughly seven steps (2 / (N + 1)).
pub const DEFAULT_ALPHA: f64 = 0.66;

/// Initial average available area, m²/person.
pub const DEFAULT_DENSITY: f64 = 7.25;

/// One recorded position in an agent's trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSample {
    pub x: i32,
    pub y: i32,
    pub tick: u64,
}

/// Grid position component; `prev` is diagnostic only.
#[derive(Debug, Clone, Copy)]
pub struct CellPos {
    pub cell: Cell,
    pub prev: Cell,
}

impl CellPos {
    pub fn new(cell: Cell) -> Self {
        Self { cell, prev: cell }
    }
}

/// Per-agent navigation state.
///
/// `vision` shrinks when line-of-sight checks fail during target search and
/// doubles back toward `max_vision` after a successful replan. `movement`
/// is clamped to never exceed `vision` at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pedestrian {
    pub id: String,
    pub desc: String,
    pub vision: i32,
    pub max_vision: i32,
    pub movement: i32,
    pub max_movement: i32,
    /// Ticks remaining before the agent becomes active; clamped at zero.
    pub entry_timer: i32,
    /// Current navigation goal. Starts at the spawn cell, which forces a
    /// replan on the first active step.
    pub target: Cell,
    /// Integer direction toward the target, y sign inverted to match the
    /// grid's vertically flipped convention.
    pub heading: (i32, i32),
    pub avg_speed: f64,
    pub avg_density: f64,
    pub alpha: f64,
    pub field: FieldId,
    pub path: Vec<PathSample>,
    pub distance_traveled: f64,
}

impl Pedestrian {
    pub fn new(id: String, start: Cell, field: FieldId, sight: i32, entry_delay: i32) -> Self {
        let max_vision = sight.max(1);
        let movement = DEFAULT_MOVEMENT.min(max_vision);
        Self {
            id,
            desc: "none".to_string(),
            vision: max_vision,
            max_vision,
            movement,
            max_movement: movement,
            entry_timer: entry_delay,
            target: start,
            heading: (0, 0),
            avg_speed: concourse_logic::speed::MAX_SPEED,
            avg_density: DEFAULT_DENSITY,
            alpha: DEFAULT_ALPHA,
            field,
            path: Vec::new(),
            distance_traveled: 0.0,
        }
    }

    /// True while the entry timer has not run out.
    pub fn is_waiting(&self) -> bool {
        self.entry_timer > 0
    }
}

/// An exited agent's archived trajectory and totals, exposed to statistics
/// collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedRun {
    pub id: String,
    pub desc: String,
    pub path: Vec<PathSample>,
    pub distance_traveled: f64,
    pub ticks_taken: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_clamped_to_vision() {
        let p = Pedestrian::new("a".into(), Cell::new(0, 0), FieldId { entrance: 0, exit: 0 }, 2, 0);
        assert_eq!(p.vision, 2);
        assert_eq!(p.movement, 2);
        assert_eq!(p.max_movement, 2);

        let q = Pedestrian::new("b".into(), Cell::new(0, 0), FieldId { entrance: 0, exit: 0 }, 20, 0);
        assert_eq!(q.movement, DEFAULT_MOVEMENT);
    }

    #[test]
    fn target_starts_at_spawn_cell() {
        let start = Cell::new(4, 4);
        let p = Pedestrian::new("a".into(), start, FieldId { entrance: 0, exit: 0 }, 10, 0);
        assert_eq!(p.target, start);
    }

    #[test]
    fn waiting_until_timer_runs_out() {
        let mut p = Pedestrian::new("a".into(), Cell::new(0, 0), FieldId { entrance: 0, exit: 0 }, 10, 2);
        assert!(p.is_waiting());
        p.entry_timer -= 1;
        assert!(p.is_waiting());
        p.entry_timer -= 1;
        assert!(!p.is_waiting());
    }
}
