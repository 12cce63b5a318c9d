//! Entrance/exit geometry and arrival probabilities.
//!
//! Entrances and exits arrive from the environment as labeled grids: a cell
//! holding `n > 0` belongs to entrance (or exit) `n - 1`. Arrival behavior
//! is a pair of cumulative distributions — which entrance a pedestrian uses,
//! and which exit it heads for conditional on that entrance — plus a
//! frequency cutoff controlling how many pedestrians enter per tick.

use concourse_logic::grid::{Cell, Grid};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Floor applied to configured probabilities so no entrance/exit pairing is
/// ever impossible.
pub const MIN_PROB: f64 = 0.01;

/// Default share of ticks that spawn an additional pedestrian.
pub const DEFAULT_FREQUENCY_CUTOFF: f64 = 0.6;

/// Cells grouped per entrance and per exit label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntranceExits {
    pub entrances: Vec<Vec<Cell>>,
    pub exits: Vec<Vec<Cell>>,
}

impl EntranceExits {
    /// Read labeled grids: positive values assign a cell to group `n - 1`.
    pub fn from_labeled_grids(entrance_grid: &Grid<i32>, exit_grid: &Grid<i32>) -> Self {
        Self {
            entrances: collect_labels(entrance_grid),
            exits: collect_labels(exit_grid),
        }
    }
}

fn collect_labels(grid: &Grid<i32>) -> Vec<Vec<Cell>> {
    let mut groups: Vec<Vec<Cell>> = Vec::new();
    for (cell, &label) in grid.iter() {
        if label > 0 {
            let index = (label - 1) as usize;
            while groups.len() <= index {
                groups.push(Vec::new());
            }
            groups[index].push(cell);
        }
    }
    groups
}

/// Cumulative entrance/exit selection tables plus spawn-rate control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalPlan {
    entrance_cdf: Vec<f64>,
    exit_cdf: Vec<Vec<f64>>,
    pub frequency_cutoff: f64,
}

impl ArrivalPlan {
    /// Uniform probability over every entrance and every exit.
    pub fn uniform(num_entrances: usize, num_exits: usize) -> Self {
        let ent_p = 1.0 / num_entrances.max(1) as f64;
        let ext_p = 1.0 / num_exits.max(1) as f64;
        Self {
            entrance_cdf: (1..=num_entrances).map(|i| i as f64 * ent_p).collect(),
            exit_cdf: (0..num_entrances)
                .map(|_| (1..=num_exits).map(|j| j as f64 * ext_p).collect())
                .collect(),
            frequency_cutoff: DEFAULT_FREQUENCY_CUTOFF,
        }
    }

    /// Build from measured probabilities, flooring each at [`MIN_PROB`] and
    /// accumulating into CDFs.
    pub fn from_tables(entrance_probs: &[f64], exit_probs: &[Vec<f64>]) -> Self {
        let mut entrance_cdf = Vec::with_capacity(entrance_probs.len());
        let mut acc = 0.0;
        for &p in entrance_probs {
            acc += p.max(MIN_PROB);
            entrance_cdf.push(acc);
        }

        let exit_cdf = exit_probs
            .iter()
            .map(|row| {
                let mut out = Vec::with_capacity(row.len());
                let mut acc = 0.0;
                for &p in row {
                    acc += p.max(MIN_PROB);
                    out.push(acc);
                }
                out
            })
            .collect();

        Self {
            entrance_cdf,
            exit_cdf,
            frequency_cutoff: DEFAULT_FREQUENCY_CUTOFF,
        }
    }

    pub fn with_frequency_cutoff(mut self, cutoff: f64) -> Self {
        self.frequency_cutoff = cutoff;
        self
    }

    pub fn entrance_count(&self) -> usize {
        self.entrance_cdf.len()
    }

    pub fn exit_count(&self) -> usize {
        self.exit_cdf.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Draw an entrance index.
    pub fn sample_entrance(&self, rng: &mut impl Rng) -> usize {
        let draw: f64 = rng.gen();
        for (i, &cdf) in self.entrance_cdf.iter().enumerate() {
            if draw <= cdf {
                return i;
            }
        }
        // Only reachable when the configured table does not sum to 1.
        self.entrance_cdf.len().saturating_sub(1)
    }

    /// Draw an exit index conditional on the entrance used.
    pub fn sample_exit(&self, entrance: usize, rng: &mut impl Rng) -> usize {
        let row = &self.exit_cdf[entrance];
        let draw: f64 = rng.gen();
        for (i, &cdf) in row.iter().enumerate() {
            if draw <= cdf {
                return i;
            }
        }
        row.len().saturating_sub(1)
    }
}
