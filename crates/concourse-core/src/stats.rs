//! Aggregate statistics over live agents.
//!
//! Per-agent EWMAs of speed and inverse density are folded into run-wide
//! mean, standard deviation, and extrema for collectors to sample at any
//! tick. Exited agents contribute through the path archive instead.

use hecs::World;

use crate::components::Pedestrian;

/// Run-wide totals maintained by the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Totals {
    /// Sum of Euclidean cell distances moved by all agents.
    pub distance_traveled: f64,
    /// Movement steps taken inside the recording window.
    pub recorded_steps: u64,
}

impl Totals {
    /// Average walking speed in m/s over recorded steps.
    pub fn average_walking_speed(&self) -> f64 {
        if self.recorded_steps == 0 {
            return 0.0;
        }
        self.distance_traveled / self.recorded_steps as f64 * concourse_logic::speed::METERS_PER_CELL
    }
}

/// Snapshot of speed/density aggregates over the current population.
#[derive(Debug, Clone, Copy)]
pub struct SpeedDensitySummary {
    pub population: usize,
    pub avg_speed: f64,
    pub std_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub avg_density: f64,
    pub std_density: f64,
    pub min_density: f64,
    pub max_density: f64,
}

/// Fold every agent's EWMAs into a summary; `None` when no agents are live.
pub fn speed_density_summary(world: &World) -> Option<SpeedDensitySummary> {
    let mut n = 0usize;
    let mut speed_sum = 0.0;
    let mut speed_sq = 0.0;
    let mut density_sum = 0.0;
    let mut density_sq = 0.0;
    let mut min_speed = f64::MAX;
    let mut max_speed = f64::MIN;
    let mut min_density = f64::MAX;
    let mut max_density = f64::MIN;

    for (_, ped) in world.query::<&Pedestrian>().iter() {
        n += 1;
        speed_sum += ped.avg_speed;
        speed_sq += ped.avg_speed * ped.avg_speed;
        density_sum += ped.avg_density;
        density_sq += ped.avg_density * ped.avg_density;
        min_speed = min_speed.min(ped.avg_speed);
        max_speed = max_speed.max(ped.avg_speed);
        min_density = min_density.min(ped.avg_density);
        max_density = max_density.max(ped.avg_density);
    }

    if n == 0 {
        return None;
    }

    let count = n as f64;
    let avg_speed = speed_sum / count;
    let avg_density = density_sum / count;
    Some(SpeedDensitySummary {
        population: n,
        avg_speed,
        std_speed: (speed_sq / count - avg_speed * avg_speed).max(0.0).sqrt(),
        min_speed,
        max_speed,
        avg_density,
        std_density: (density_sq / count - avg_density * avg_density)
            .max(0.0)
            .sqrt(),
        min_density,
        max_density,
    })
}
