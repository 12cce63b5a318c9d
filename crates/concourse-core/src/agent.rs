//! Per-agent navigation logic: replan decision, target search, movement.
//!
//! These functions take their collaborators explicitly — cost surface,
//! gradient field, occupancy, RNG — so they are unit-testable without an
//! engine. The engine's tick loop wires them together in
//! [`crate::engine::Simulation`].

use concourse_logic::cost::CostSurface;
use concourse_logic::gradient::GradientField;
use concourse_logic::grid::Cell;
use concourse_logic::neighborhood::Neighborhood;
use concourse_logic::sight;
use concourse_logic::speed;
use hecs::Entity;
use rand::Rng;

use crate::components::Pedestrian;
use crate::occupancy::OccupancyIndex;

/// Probability per step of re-verifying line of sight to the current
/// target. A trade-off between replan cost and stale-target accuracy.
pub const LOS_RECHECK_PROBABILITY: f64 = 0.2;

/// Read-only collaborators for one navigation step.
pub struct NavContext<'a> {
    pub cost: &'a CostSurface,
    pub field: &'a GradientField,
    pub occupancy: &'a OccupancyIndex,
    pub shape: Neighborhood,
}

/// What the movement phase did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Stepped to a new cell.
    Moved(Cell),
    /// Eligible neighbors existed but staying put scored best.
    Stayed,
    /// No viable movement neighbor at all this step.
    Blocked,
}

/// Decide whether the agent needs a new target destination.
///
/// Replan when: arrived at the target; the target is near (within the
/// movement radius) and occupied by someone else; the current cell is no
/// longer strictly farther from the exit than the target; or — with
/// probability [`LOS_RECHECK_PROBABILITY`] — line of sight to the target is
/// obstructed.
pub fn should_replan(
    ped: &Pedestrian,
    agent: Entity,
    at: Cell,
    ctx: &NavContext<'_>,
    rng: &mut impl Rng,
) -> bool {
    if at == ped.target {
        return true;
    }
    let movement_sq = (ped.movement as i64) * (ped.movement as i64);
    if at.distance_squared(ped.target) <= movement_sq
        && ctx.occupancy.is_occupied_by_other(ped.target, agent)
    {
        return true;
    }
    match (ctx.field.value(at), ctx.field.value(ped.target)) {
        (Some(here), Some(there)) => {
            if here <= there {
                return true;
            }
        }
        // A target without a finite gradient is never worth keeping.
        _ => return true,
    }
    if rng.gen::<f64>() < LOS_RECHECK_PROBABILITY
        && sight::obstruction_distance(ctx.cost, at, ped.target).is_some()
    {
        return true;
    }
    false
}

/// Search within the vision radius for the lowest-gradient reachable cell
/// with clear line of sight, shrinking vision toward observed obstructions.
///
/// The current cell participates as a floor candidate at its own gradient
/// value, so picking it (and thereby forcing another replan next step) is a
/// legitimate outcome. The shrink loop is capped at `max_vision + 1`
/// iterations; on exhaustion the agent keeps its old target and retries on
/// its next scheduled step. After a successful search the vision doubles,
/// capped at `max_vision`, restoring foresight over time.
pub fn find_target(
    ped: &mut Pedestrian,
    at: Cell,
    ctx: &NavContext<'_>,
    rng: &mut impl Rng,
) -> Option<Cell> {
    let current_height = ctx.field.value(at)?;
    let width = ctx.cost.width();
    let height = ctx.cost.height();

    for _ in 0..=ped.max_vision {
        let mut min_height = current_height;
        let mut candidates: Vec<Cell> = vec![at];

        for cell in ctx.shape.collect(at, ped.vision, width, height) {
            if ctx.occupancy.is_occupied(cell) {
                continue;
            }
            let Some(value) = ctx.field.value(cell) else {
                continue;
            };
            if value < min_height {
                min_height = value;
                candidates.clear();
                candidates.push(cell);
            } else if value == min_height {
                candidates.push(cell);
            }
        }

        // Keep only candidates the agent can actually see; remember how far
        // away the nearest obstruction was for the shrink step.
        let mut clear: Vec<Cell> = Vec::new();
        let mut min_new_vision = ped.max_vision;
        for &candidate in &candidates {
            match sight::obstruction_distance(ctx.cost, at, candidate) {
                None => clear.push(candidate),
                Some(d) => min_new_vision = min_new_vision.min(d as i32),
            }
        }

        if !clear.is_empty() {
            let target = clear[rng.gen_range(0..clear.len())];
            ped.vision = (ped.vision * 2).min(ped.max_vision);
            return Some(target);
        }

        // Every candidate was obstructed: pull vision in to the nearest
        // obstruction, or just decrement when that would not shrink it.
        ped.vision = if ped.vision <= min_new_vision {
            ped.vision - 1
        } else {
            min_new_vision
        };
        if ped.vision < 1 {
            ped.vision = 1;
        }
    }

    None
}

/// Pick the cell to step to this tick.
///
/// Local density over the movement neighborhood bounds the step radius via
/// the walking-speed table. Candidates are scored by the dot product of
/// their offset with the heading vector; the exact target cell wins
/// outright. Ties resolve to the lowest gradient value, seeded by a random
/// index so a tie with no gradient improvement still resolves. The current
/// cell always participates as the zero-score fallback.
///
/// Also feeds the agent's average-density EWMA with the neighborhood's
/// available area per person.
pub fn choose_step(
    ped: &mut Pedestrian,
    at: Cell,
    ctx: &NavContext<'_>,
    rng: &mut impl Rng,
) -> MoveOutcome {
    let width = ctx.cost.width();
    let height = ctx.cost.height();
    let neighbors = ctx.shape.collect(at, ped.max_movement, width, height);

    let occupants = ctx.occupancy.count_in(&neighbors);
    let area = speed::available_area(neighbors.len(), occupants);
    let radius = speed::walking_speed(area) * speed::SPEED_TO_CELLS;
    let radius_sq = radius * radius;

    ped.avg_density = ped.alpha * area + (1.0 - ped.alpha) * ped.avg_density;

    let mut max_dot = 0.0_f64;
    let mut best: Vec<Cell> = vec![at];
    let mut eligible = 0usize;

    for cell in neighbors {
        if ctx.occupancy.is_occupied(cell)
            || ctx.field.value(cell).is_none()
            || ctx.cost.is_blocked(cell)
        {
            continue;
        }
        let dx = cell.x - at.x;
        let dy = -(cell.y - at.y);
        let dist_sq = (dx as f64) * (dx as f64) + (dy as f64) * (dy as f64);
        if dist_sq > radius_sq {
            continue;
        }
        eligible += 1;

        // The exact target cell counts as an infinite score: it wins
        // outright and ends the tie-break process.
        if cell == ped.target {
            best.clear();
            best.push(cell);
            break;
        }

        let dot = (dx * ped.heading.0 + dy * ped.heading.1) as f64;
        if dot > max_dot {
            best.clear();
            max_dot = dot;
            best.push(cell);
        } else if dot == max_dot {
            best.push(cell);
        }
    }

    if eligible == 0 {
        return MoveOutcome::Blocked;
    }

    let chosen = if best.len() == 1 {
        best[0]
    } else {
        // Among dot-product ties, prefer the lowest gradient; the random
        // starting index resolves the no-improvement case.
        let mut min_grad = i32::MAX;
        let mut index = rng.gen_range(0..best.len());
        for (i, &cell) in best.iter().enumerate() {
            if let Some(v) = ctx.field.value(cell) {
                if v < min_grad && !ctx.cost.is_blocked(cell) {
                    min_grad = v;
                    index = i;
                }
            }
        }
        best[index]
    };

    if chosen == at {
        MoveOutcome::Stayed
    } else {
        MoveOutcome::Moved(chosen)
    }
}
