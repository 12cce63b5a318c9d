//! Per-pairing gradient field set.
//!
//! The engine holds one gradient field per (entrance, exit) pairing, built
//! once at setup and read-only afterwards. The set carries the global
//! minimum and maximum finite values across all fields; the global minimum
//! is the value an agent's cell must reach for the agent to count as exited.

use concourse_logic::cost::CostSurface;
use concourse_logic::gradient::{self, FieldError, GradientField};
use concourse_logic::grid::{Cell, Grid};
use serde::{Deserialize, Serialize};

/// Identifies the gradient field for one (entrance, exit) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldId {
    pub entrance: usize,
    pub exit: usize,
}

/// All gradient fields for a run, with aggregated extrema.
#[derive(Debug)]
pub struct FieldSet {
    fields: Vec<GradientField>,
    entrances: usize,
    exits: usize,
    global_min: i32,
    global_max: i32,
}

impl FieldSet {
    /// Build one field per (entrance, exit) pairing and validate that every
    /// entrance cell can reach its paired exits.
    ///
    /// `weights` optionally biases all pairings toward historically busy
    /// cells; per-pairing weight grids can be layered on by building fields
    /// individually with [`gradient::build`].
    pub fn build_all(
        cost: &CostSurface,
        entrances: &[Vec<Cell>],
        exits: &[Vec<Cell>],
        weights: Option<&Grid<i32>>,
    ) -> Result<Self, FieldError> {
        if entrances.is_empty() {
            return Err(FieldError::NoEntranceCells);
        }
        if exits.is_empty() {
            return Err(FieldError::NoExitCells);
        }

        let mut fields = Vec::with_capacity(entrances.len() * exits.len());
        let mut global_min = i32::MAX;
        let mut global_max = i32::MIN;

        for (ent, entrance_cells) in entrances.iter().enumerate() {
            for (ext, exit_cells) in exits.iter().enumerate() {
                let field = gradient::build(cost, exit_cells, weights)?;
                field.validate_entrances(entrance_cells)?;
                global_min = global_min.min(field.min_value());
                global_max = global_max.max(field.max_value());
                log::info!(
                    "gradient field entrance {} → exit {}: range {}..{}",
                    ent,
                    ext,
                    field.min_value(),
                    field.max_value()
                );
                fields.push(field);
            }
        }

        Ok(Self {
            fields,
            entrances: entrances.len(),
            exits: exits.len(),
            global_min,
            global_max,
        })
    }

    pub fn field(&self, id: FieldId) -> &GradientField {
        &self.fields[id.entrance * self.exits + id.exit]
    }

    pub fn entrance_count(&self) -> usize {
        self.entrances
    }

    pub fn exit_count(&self) -> usize {
        self.exits
    }

    /// Smallest finite value across all fields — the "reached exit" value.
    pub fn global_min(&self) -> i32 {
        self.global_min
    }

    pub fn global_max(&self) -> i32 {
        self.global_max
    }
}
