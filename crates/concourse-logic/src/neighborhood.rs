//! Neighborhood enumeration.
//!
//! Agents plan and move over a configurable neighborhood shape. The disc is
//! implemented by post-filtering the square enumeration by Euclidean
//! distance. The center cell is never included — its roles (density anchor,
//! stay-put fallback) are handled explicitly by callers.

use serde::{Deserialize, Serialize};

use crate::grid::Cell;

/// Neighborhood shape used for target search, movement candidates, and
/// density sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Neighborhood {
    /// Chebyshev square: all cells with max(|dx|, |dy|) ≤ r.
    Square,
    /// Manhattan diamond: all cells with |dx| + |dy| ≤ r.
    Manhattan,
    /// Euclidean disc: square enumeration filtered by dx² + dy² ≤ r².
    #[default]
    Disc,
}

impl Neighborhood {
    /// Collect all in-bounds cells within `radius` of `center`, excluding
    /// the center itself.
    pub fn collect(&self, center: Cell, radius: i32, width: i32, height: i32) -> Vec<Cell> {
        let mut cells = Vec::new();
        if radius <= 0 {
            return cells;
        }
        let r2 = (radius as i64) * (radius as i64);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let keep = match self {
                    Neighborhood::Square => true,
                    Neighborhood::Manhattan => dx.abs() + dy.abs() <= radius,
                    Neighborhood::Disc => {
                        (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64) <= r2
                    }
                };
                if !keep {
                    continue;
                }
                let cell = Cell::new(center.x + dx, center.y + dy);
                if cell.x >= 0 && cell.x < width && cell.y >= 0 && cell.y < height {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}
