//! Concourse simulation engine.
//!
//! Owns the mutable half of the system: pedestrian agents in a [`hecs`]
//! world, the occupancy index they share, the discrete-event queue that
//! drives their self-rescheduling steps, arrivals, traces, and statistics.
//! The immutable precompute half (cost surface, gradient fields) comes from
//! `concourse-logic`.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`agent`] | Per-agent replan / target-search / movement step logic |
//! | [`arrivals`] | Entrance/exit geometry and probabilistic spawning |
//! | [`components`] | Pedestrian and position components, archived runs |
//! | [`engine`] | The `Simulation` struct and tick loop |
//! | [`fields`] | Per-pairing gradient field set with global extrema |
//! | [`occupancy`] | Cell → agents spatial index |
//! | [`scheduler`] | Discrete-event queue keyed by next eligible tick |
//! | [`stats`] | Aggregate speed/density statistics |
//! | [`trace`] | Historical traffic trace grid |

pub mod agent;
pub mod arrivals;
pub mod components;
pub mod engine;
pub mod fields;
pub mod occupancy;
pub mod scheduler;
pub mod stats;
pub mod trace;

pub use components::{CellPos, CompletedRun, PathSample, Pedestrian};
pub use engine::{SimConfig, Simulation, StepOutcome};
pub use fields::{FieldId, FieldSet};
