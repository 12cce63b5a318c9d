//! Historical traffic traces.
//!
//! Every active agent bumps the trace count at its cell while the tick lies
//! inside the recording window. The accumulated grid feeds heat-biased
//! gradient builds on later runs; writing it out is a host concern.

use concourse_logic::grid::{Cell, Grid};

/// Per-cell visit counts gathered over a recording window.
#[derive(Debug, Clone)]
pub struct TraceGrid {
    grid: Grid<f64>,
    start: u64,
    end: u64,
}

impl TraceGrid {
    pub fn new(width: i32, height: i32, start: u64, end: u64) -> Self {
        Self {
            grid: Grid::filled(width, height, 0.0),
            start,
            end,
        }
    }

    pub fn in_window(&self, tick: u64) -> bool {
        tick >= self.start && tick <= self.end
    }

    /// Count a visit if the tick falls inside the recording window.
    pub fn record(&mut self, cell: Cell, tick: u64) {
        if self.in_window(tick) {
            if let Some(v) = self.grid.get_mut(cell) {
                *v += 1.0;
            }
        }
    }

    pub fn count(&self, cell: Cell) -> f64 {
        self.grid.get(cell).copied().unwrap_or(0.0)
    }

    /// Visit counts normalized by the given total step count.
    pub fn normalized(&self, total_steps: u64) -> Grid<f64> {
        let mut out = self.grid.clone();
        if total_steps == 0 {
            return out;
        }
        let scale = 1.0 / total_steps as f64;
        for y in 0..out.height() {
            for x in 0..out.width() {
                let cell = Cell::new(x, y);
                if let Some(v) = out.get_mut(cell) {
                    *v *= scale;
                }
            }
        }
        out
    }

    /// Integer weight grid for heat-biased gradient construction.
    pub fn as_weights(&self) -> Grid<i32> {
        let mut out = Grid::filled(self.grid.width(), self.grid.height(), 1);
        for (cell, &v) in self.grid.iter() {
            out.set(cell, (v as i32).max(1));
        }
        out
    }
}
