//! Combined cost surface.
//!
//! Raster providers hand the engine several per-cell layers (walkable area,
//! obstacles); this module merges them into the single passability grid that
//! gradient construction and live navigation both consult. A cell with cost
//! greater than zero is impassable; zero is walkable. The surface is
//! immutable for the duration of a run.

use crate::grid::{Cell, Grid};

/// Raster no-data marker used by the upstream layer files.
pub const NO_DATA: f64 = -9999.0;

/// The merged passability surface.
#[derive(Debug, Clone)]
pub struct CostSurface {
    grid: Grid<f64>,
}

/// Errors from cost-surface construction.
#[derive(Debug)]
pub enum SurfaceError {
    DimensionMismatch {
        expected: (i32, i32),
        found: (i32, i32),
    },
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::DimensionMismatch { expected, found } => write!(
                f,
                "layer dimensions {}×{} do not match {}×{}",
                found.0, found.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for SurfaceError {}

impl CostSurface {
    /// Wrap an already-merged grid. Values > 0 are impassable.
    pub fn from_grid(grid: Grid<f64>) -> Self {
        Self { grid }
    }

    /// A fully walkable surface, mainly for tests and synthetic scenarios.
    pub fn open(width: i32, height: i32) -> Self {
        Self {
            grid: Grid::filled(width, height, 0.0),
        }
    }

    /// Merge a walkable layer and an obstacle layer into one surface.
    ///
    /// A cell is impassable when the obstacle layer carries a positive value,
    /// or when the walkable layer marks it as outside the walkable area
    /// (non-positive or no-data). Obstacle magnitudes are preserved so hosts
    /// can distinguish obstruction classes; walkability gaps are marked 1.0.
    pub fn merge(walkable: &Grid<f64>, obstacles: &Grid<f64>) -> Result<Self, SurfaceError> {
        if !walkable.same_dimensions(obstacles) {
            return Err(SurfaceError::DimensionMismatch {
                expected: (walkable.width(), walkable.height()),
                found: (obstacles.width(), obstacles.height()),
            });
        }

        let mut merged = Grid::filled(walkable.width(), walkable.height(), 0.0);
        for (cell, &walk) in walkable.iter() {
            let obstacle = obstacles.get(cell).copied().unwrap_or(NO_DATA);
            let cost = if obstacle != NO_DATA && obstacle > 0.0 {
                obstacle
            } else if walk == NO_DATA || walk <= 0.0 {
                1.0
            } else {
                0.0
            };
            merged.set(cell, cost);
        }
        Ok(Self { grid: merged })
    }

    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.grid.in_bounds(cell)
    }

    /// Raw cost value; `None` out of bounds.
    pub fn cost(&self, cell: Cell) -> Option<f64> {
        self.grid.get(cell).copied()
    }

    /// True when the cell is in bounds and walkable.
    pub fn is_passable(&self, cell: Cell) -> bool {
        matches!(self.grid.get(cell), Some(&c) if c <= 0.0)
    }

    /// True when the cell obstructs movement or sight. Out-of-bounds cells
    /// count as blocked.
    pub fn is_blocked(&self, cell: Cell) -> bool {
        !self.is_passable(cell)
    }
}
