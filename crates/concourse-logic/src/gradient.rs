//! Steps-to-exit gradient fields.
//!
//! One field is built per (entrance, exit) pairing at setup time and is
//! read-only afterwards. The builder runs a multi-source relaxation from the
//! exit cells outward across the cost surface; an optional weight grid biases
//! the metric toward historically busy cells.

use crate::cost::CostSurface;
use crate::grid::{Cell, Grid};

/// Sentinel stored at obstacle cells. Never a valid distance.
pub const OBSTACLE: i32 = -1;

/// Sentinel for passable cells no exit can reach.
pub const UNREACHED: i32 = i32::MAX;

/// A complete steps-to-exit field with its finite value range.
///
/// Exit cells hold 0. The minimum and maximum are computed once at build time
/// and carried on the field so no caller needs a global registry.
#[derive(Debug, Clone)]
pub struct GradientField {
    grid: Grid<i32>,
    min: i32,
    max: i32,
}

/// Errors from gradient-field construction and validation.
#[derive(Debug)]
pub enum FieldError {
    /// The exit cell set was empty, or no exit cell was passable.
    NoExitCells,
    /// No entrance cell set was provided for a run that spawns agents.
    NoEntranceCells,
    /// The weight grid does not match the cost surface dimensions.
    WeightDimensionMismatch {
        expected: (i32, i32),
        found: (i32, i32),
    },
    /// An entrance cell used by live agents has no finite distance.
    UnreachableEntrance { cell: Cell },
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::NoExitCells => write!(f, "gradient field seeded with no passable exit cells"),
            FieldError::NoEntranceCells => write!(f, "no entrance cells configured"),
            FieldError::WeightDimensionMismatch { expected, found } => write!(
                f,
                "weight grid dimensions {}×{} do not match surface {}×{}",
                found.0, found.1, expected.0, expected.1
            ),
            FieldError::UnreachableEntrance { cell } => write!(
                f,
                "entrance cell ({}, {}) is unreachable from the exit set",
                cell.x, cell.y
            ),
        }
    }
}

impl std::error::Error for FieldError {}

impl GradientField {
    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    /// Finite distance at a cell; `None` for obstacles, unreachable cells,
    /// and out-of-bounds coordinates.
    pub fn value(&self, cell: Cell) -> Option<i32> {
        match self.grid.get(cell) {
            Some(&v) if v != OBSTACLE && v != UNREACHED => Some(v),
            _ => None,
        }
    }

    /// Raw stored value including sentinels; `None` out of bounds.
    pub fn raw(&self, cell: Cell) -> Option<i32> {
        self.grid.get(cell).copied()
    }

    /// Smallest finite value in the field (0 at the exits).
    pub fn min_value(&self) -> i32 {
        self.min
    }

    /// Largest finite value in the field.
    pub fn max_value(&self) -> i32 {
        self.max
    }

    /// Check that every given entrance cell carries a finite distance.
    /// A failure is a configuration error: agents spawned there would
    /// occupy a field-unreachable cell.
    pub fn validate_entrances(&self, entrances: &[Cell]) -> Result<(), FieldError> {
        for &cell in entrances {
            if self.value(cell).is_none() {
                return Err(FieldError::UnreachableEntrance { cell });
            }
        }
        Ok(())
    }
}

/// Build one gradient field from the cost surface and a set of exit cells.
///
/// Relaxation proceeds from the exits outward. The open set is scanned
/// linearly for the minimum tentative distance, ties broken by insertion
/// order — a deliberate simplification over a balanced priority queue.
/// Correctness is unaffected; the cost is O(N²) in open cells, which is
/// acceptable for a precompute run once per pairing.
///
/// With `weights`, stepping into a neighbor costs `max(1, weight)` instead
/// of a flat 1, biasing routes toward historically traveled cells.
pub fn build(
    cost: &CostSurface,
    exits: &[Cell],
    weights: Option<&Grid<i32>>,
) -> Result<GradientField, FieldError> {
    if exits.is_empty() {
        return Err(FieldError::NoExitCells);
    }
    if let Some(w) = weights {
        if w.width() != cost.width() || w.height() != cost.height() {
            return Err(FieldError::WeightDimensionMismatch {
                expected: (cost.width(), cost.height()),
                found: (w.width(), w.height()),
            });
        }
    }

    let width = cost.width();
    let height = cost.height();
    let mut dist: Grid<i32> = Grid::filled(width, height, UNREACHED);
    let mut done: Grid<bool> = Grid::filled(width, height, false);
    let mut queued: Grid<bool> = Grid::filled(width, height, false);

    for y in 0..height {
        for x in 0..width {
            let cell = Cell::new(x, y);
            if cost.is_blocked(cell) {
                dist.set(cell, OBSTACLE);
            }
        }
    }

    // Seed the open set with every passable exit cell at distance 0.
    let mut open: Vec<Cell> = Vec::new();
    for &exit in exits {
        if cost.is_passable(exit) && !*queued.get(exit).unwrap_or(&true) {
            dist.set(exit, 0);
            queued.set(exit, true);
            open.push(exit);
        }
    }
    if open.is_empty() {
        return Err(FieldError::NoExitCells);
    }

    while !open.is_empty() {
        // Stable linear-scan extraction: strict comparison keeps the
        // first-inserted cell among ties.
        let mut best = 0;
        for (i, &cell) in open.iter().enumerate().skip(1) {
            let d = *dist.get(cell).unwrap_or(&UNREACHED);
            let b = *dist.get(open[best]).unwrap_or(&UNREACHED);
            if d < b {
                best = i;
            }
        }
        let current = open.remove(best);
        done.set(current, true);
        let current_dist = *dist.get(current).unwrap_or(&UNREACHED);

        for neighbor in current.orthogonal() {
            if !cost.in_bounds(neighbor) || *done.get(neighbor).unwrap_or(&true) {
                continue;
            }
            if cost.is_blocked(neighbor) {
                dist.set(neighbor, OBSTACLE);
                done.set(neighbor, true);
                continue;
            }
            let step = weights
                .and_then(|w| w.get(neighbor).copied())
                .map(|w| w.max(1))
                .unwrap_or(1);
            let tentative = current_dist.saturating_add(step);
            let known = *dist.get(neighbor).unwrap_or(&UNREACHED);
            if tentative < known {
                dist.set(neighbor, tentative);
            }
            if !*queued.get(neighbor).unwrap_or(&true) {
                queued.set(neighbor, true);
                open.push(neighbor);
            }
        }
    }

    let mut min = i32::MAX;
    let mut max = i32::MIN;
    for (_, &v) in dist.iter() {
        if v != OBSTACLE && v != UNREACHED {
            min = min.min(v);
            max = max.max(v);
        }
    }

    Ok(GradientField {
        grid: dist,
        min,
        max,
    })
}
