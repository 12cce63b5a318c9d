//! The simulation engine.
//!
//! `Simulation` owns the hecs world of pedestrians, the occupancy index,
//! the discrete-event queue, and the immutable cost surface and gradient
//! fields. Everything runs single-threaded and cooperative: each agent step
//! runs to completion, and an exiting agent is detached from the occupancy
//! index before its step returns, so no later step in the same tick can
//! observe a ghost occupant.

use concourse_logic::cost::CostSurface;
use concourse_logic::grid::Cell;
use concourse_logic::neighborhood::Neighborhood;
use concourse_logic::speed;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::agent::{self, MoveOutcome, NavContext};
use crate::arrivals::{ArrivalPlan, EntranceExits};
use crate::components::{CellPos, CompletedRun, PathSample, Pedestrian};
use crate::fields::{FieldId, FieldSet};
use crate::occupancy::OccupancyIndex;
use crate::scheduler::EventQueue;
use crate::stats::{self, SpeedDensitySummary, Totals};
use crate::trace::TraceGrid;

/// Run-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for the single shared uniform source.
    pub seed: u64,
    /// How many cells a pedestrian can see for planning.
    pub planning_vision: i32,
    /// Neighborhood shape for planning, movement, and density sampling.
    pub neighborhood: Neighborhood,
    /// First tick of the trace recording window.
    pub start_keeping_records: u64,
    /// Last tick of the trace recording window.
    pub end_keeping_records: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            planning_vision: 20,
            neighborhood: Neighborhood::Disc,
            start_keeping_records: 10,
            end_keeping_records: u64::MAX,
        }
    }
}

/// What one scheduled agent step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Entry timer still running; navigation skipped, step rescheduled.
    Waiting,
    /// Stepped from one cell to another.
    Moved { from: Cell, to: Cell },
    /// Eligible neighbors existed; staying put scored best.
    Stayed,
    /// No viable movement neighbor this tick.
    Blocked,
    /// Reached a cell at the global minimum gradient; removed and archived.
    Exited,
    /// The entity no longer exists.
    Missing,
}

/// The crowd simulation: agents, shared spatial state, and the event queue.
pub struct Simulation {
    world: World,
    occupancy: OccupancyIndex,
    cost: CostSurface,
    fields: FieldSet,
    queue: EventQueue,
    rng: StdRng,
    tick: u64,
    trace: TraceGrid,
    totals: Totals,
    archive: Vec<CompletedRun>,
    geometry: Option<EntranceExits>,
    arrivals: Option<ArrivalPlan>,
    config: SimConfig,
}

impl Simulation {
    pub fn new(cost: CostSurface, fields: FieldSet, config: SimConfig) -> Self {
        log::info!(
            "simulation: {}×{} surface, {} entrance(s) × {} exit(s), seed {}",
            cost.width(),
            cost.height(),
            fields.entrance_count(),
            fields.exit_count(),
            config.seed
        );
        let trace = TraceGrid::new(
            cost.width(),
            cost.height(),
            config.start_keeping_records,
            config.end_keeping_records,
        );
        Self {
            world: World::new(),
            occupancy: OccupancyIndex::new(),
            cost,
            fields,
            queue: EventQueue::new(),
            rng: StdRng::seed_from_u64(config.seed),
            tick: 0,
            trace,
            totals: Totals::default(),
            archive: Vec::new(),
            geometry: None,
            arrivals: None,
            config,
        }
    }

    /// Enable probabilistic arrivals through the given geometry.
    pub fn attach_arrivals(&mut self, geometry: EntranceExits, plan: ArrivalPlan) {
        self.geometry = Some(geometry);
        self.arrivals = Some(plan);
    }

    /// Create a pedestrian at a cell, register it in the occupancy index,
    /// and schedule its first step for the current tick. A positive
    /// `entry_delay` makes the agent wait in place that many steps.
    pub fn spawn_pedestrian(&mut self, cell: Cell, field: FieldId, entry_delay: i32) -> Entity {
        let id = format!("{:x}", self.rng.gen::<u64>());
        let ped = Pedestrian::new(id, cell, field, self.config.planning_vision, entry_delay);
        let entity = self.world.spawn((ped, CellPos::new(cell)));
        self.occupancy.insert(entity, cell);
        self.queue.schedule_at(entity, self.tick);
        entity
    }

    /// Run arrivals for this tick, then every agent step due at or before
    /// the current tick, then advance the clock.
    pub fn step_tick(&mut self) {
        self.run_arrivals();
        while let Some(agent) = self.queue.pop_due(self.tick) {
            self.step_entity(agent);
        }
        self.tick += 1;
    }

    /// Run a fixed number of ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step_tick();
        }
    }

    /// Step until no agent remains scheduled or `max_ticks` have elapsed.
    /// Returns the number of ticks consumed.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let start = self.tick;
        while !self.queue.is_empty() && self.tick - start < max_ticks {
            self.step_tick();
        }
        self.tick - start
    }

    fn run_arrivals(&mut self) {
        let Some(plan) = self.arrivals.take() else {
            return;
        };
        self.spawn_arrival(&plan);
        while self.rng.gen::<f64>() < plan.frequency_cutoff {
            self.spawn_arrival(&plan);
        }
        self.arrivals = Some(plan);
    }

    /// One arrival attempt: draw an entrance and a conditional exit, then
    /// look for a free entrance tile with a bounded number of retries. All
    /// tiles may be occupied; in that case nobody enters this attempt.
    fn spawn_arrival(&mut self, plan: &ArrivalPlan) {
        let (start, field) = {
            let Some(geometry) = self.geometry.as_ref() else {
                return;
            };
            let entrance = plan.sample_entrance(&mut self.rng);
            let exit = plan.sample_exit(entrance, &mut self.rng);
            let tiles = &geometry.entrances[entrance];
            if tiles.is_empty() {
                return;
            }
            let mut start = tiles[self.rng.gen_range(0..tiles.len())];
            let mut tries = tiles.len() * 2;
            while self.occupancy.is_occupied(start) && tries > 0 {
                start = tiles[self.rng.gen_range(0..tiles.len())];
                tries -= 1;
            }
            if tries == 0 {
                return;
            }
            (start, FieldId { entrance, exit })
        };
        self.spawn_pedestrian(start, field, 0);
    }

    /// Execute one agent step: record, wait or navigate, move, and either
    /// archive (on exit) or reschedule with a delay of `1 + gradient`.
    pub fn step_entity(&mut self, agent: Entity) -> StepOutcome {
        let tick = self.tick;
        let global_min = self.fields.global_min();
        let shape = self.config.neighborhood;

        let (outcome, delay) = {
            let Ok((ped, pos)) = self
                .world
                .query_one_mut::<(&mut Pedestrian, &mut CellPos)>(agent)
            else {
                return StepOutcome::Missing;
            };

            let at = pos.cell;
            ped.path.push(PathSample {
                x: at.x,
                y: at.y,
                tick,
            });

            ped.entry_timer -= 1;
            if ped.entry_timer < 0 {
                ped.entry_timer = 0;
            }

            let field = self.fields.field(ped.field);
            let entry_gradient = field.value(at).unwrap_or(0);
            let delay = 1 + entry_gradient.max(0) as u64;

            if ped.entry_timer > 0 {
                (StepOutcome::Waiting, Some(delay))
            } else {
                self.trace.record(at, tick);

                if field.value(at) == Some(global_min) {
                    let first_tick = ped.path.first().map(|s| s.tick).unwrap_or(tick);
                    let run = CompletedRun {
                        id: ped.id.clone(),
                        desc: ped.desc.clone(),
                        path: std::mem::take(&mut ped.path),
                        distance_traveled: ped.distance_traveled,
                        ticks_taken: tick - first_tick,
                    };
                    self.occupancy.remove(agent, at);
                    self.archive.push(run);
                    (StepOutcome::Exited, None)
                } else {
                    let ctx = NavContext {
                        cost: &self.cost,
                        field,
                        occupancy: &self.occupancy,
                        shape,
                    };

                    if agent::should_replan(ped, agent, at, &ctx, &mut self.rng) {
                        // On search exhaustion the old target stays; the
                        // agent retries on its next scheduled step.
                        if let Some(target) = agent::find_target(ped, at, &ctx, &mut self.rng) {
                            ped.target = target;
                        }
                    }

                    ped.heading = (ped.target.x - at.x, -(ped.target.y - at.y));
                    let moved = agent::choose_step(ped, at, &ctx, &mut self.rng);

                    if self.trace.in_window(tick) {
                        self.totals.recorded_steps += 1;
                    }

                    let outcome = match moved {
                        MoveOutcome::Moved(to) => {
                            pos.prev = at;
                            pos.cell = to;
                            self.occupancy.relocate(agent, at, to);
                            let dist = at.distance(to);
                            ped.distance_traveled += dist;
                            self.totals.distance_traveled += dist;
                            let sample = speed::METERS_PER_CELL * dist;
                            ped.avg_speed = ped.alpha * sample + (1.0 - ped.alpha) * ped.avg_speed;
                            StepOutcome::Moved { from: at, to }
                        }
                        MoveOutcome::Stayed | MoveOutcome::Blocked => {
                            ped.avg_speed = (1.0 - ped.alpha) * ped.avg_speed;
                            if moved == MoveOutcome::Stayed {
                                StepOutcome::Stayed
                            } else {
                                StepOutcome::Blocked
                            }
                        }
                    };
                    (outcome, Some(delay))
                }
            }
        };

        match delay {
            Some(d) => self.queue.schedule_after(agent, tick, d),
            None => {
                // Exited: the entity leaves the world entirely.
                let _ = self.world.despawn(agent);
            }
        }
        outcome
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of live (waiting or active) pedestrians.
    pub fn population(&self) -> usize {
        self.occupancy.total()
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn cost(&self) -> &CostSurface {
        &self.cost
    }

    /// Archived trajectories of exited agents.
    pub fn completed(&self) -> &[CompletedRun] {
        &self.archive
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn trace(&self) -> &TraceGrid {
        &self.trace
    }

    pub fn scheduled_steps(&self) -> usize {
        self.queue.len()
    }

    /// Aggregate speed/density statistics over live agents.
    pub fn summary(&self) -> Option<SpeedDensitySummary> {
        stats::speed_density_summary(&self.world)
    }

    /// Read a live agent's state, if it still exists.
    pub fn pedestrian(&self, agent: Entity) -> Option<hecs::Ref<'_, Pedestrian>> {
        self.world.get::<&Pedestrian>(agent).ok()
    }

    /// Read a live agent's position, if it still exists.
    pub fn position(&self, agent: Entity) -> Option<Cell> {
        self.world.get::<&CellPos>(agent).ok().map(|p| p.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concourse_logic::grid::Grid;

    fn open_sim(side: i32) -> Simulation {
        let cost = CostSurface::open(side, side);
        let entrances = vec![vec![Cell::new(side - 1, side - 1)]];
        let exits = vec![vec![Cell::new(0, 0)]];
        let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
        Simulation::new(cost, fields, SimConfig::default())
    }

    #[test]
    fn first_active_step_replans_and_makes_progress() {
        let mut sim = open_sim(5);
        let start = Cell::new(4, 4);
        let agent = sim.spawn_pedestrian(start, FieldId { entrance: 0, exit: 0 }, 0);

        let outcome = sim.step_entity(agent);
        match outcome {
            StepOutcome::Moved { from, to } => {
                assert_eq!(from, start);
                assert!(to.manhattan(Cell::new(0, 0)) < start.manhattan(Cell::new(0, 0)));
            }
            other => panic!("expected Moved, got {:?}", other),
        }
        // Replanning picked a real target, not the spawn cell.
        let ped = sim.pedestrian(agent).unwrap();
        assert_ne!(ped.target, start);
    }

    #[test]
    fn waiting_agents_skip_navigation_but_reschedule() {
        let mut sim = open_sim(5);
        let start = Cell::new(4, 4);
        let agent = sim.spawn_pedestrian(start, FieldId { entrance: 0, exit: 0 }, 3);

        assert_eq!(sim.step_entity(agent), StepOutcome::Waiting);
        assert_eq!(sim.step_entity(agent), StepOutcome::Waiting);
        assert_eq!(sim.position(agent), Some(start));
        // Third step: the timer hits zero and the agent navigates.
        assert!(matches!(sim.step_entity(agent), StepOutcome::Moved { .. }));
    }

    #[test]
    fn agent_on_exit_cell_is_archived_and_detached() {
        let mut sim = open_sim(5);
        let exit = Cell::new(0, 0);
        let agent = sim.spawn_pedestrian(exit, FieldId { entrance: 0, exit: 0 }, 0);
        let scheduled_before = sim.scheduled_steps();

        assert_eq!(sim.step_entity(agent), StepOutcome::Exited);
        assert_eq!(sim.population(), 0);
        assert_eq!(sim.completed().len(), 1);
        assert!(!sim.completed()[0].path.is_empty());
        assert!(sim.pedestrian(agent).is_none());
        // No new step was scheduled for the exited agent.
        assert_eq!(sim.scheduled_steps(), scheduled_before);
    }

    #[test]
    fn agent_walks_to_the_exit_and_leaves() {
        let mut sim = open_sim(5);
        sim.spawn_pedestrian(Cell::new(4, 4), FieldId { entrance: 0, exit: 0 }, 0);

        sim.run_until_idle(200);
        assert_eq!(sim.population(), 0);
        assert_eq!(sim.completed().len(), 1);
        let run = &sim.completed()[0];
        assert!(run.distance_traveled > 0.0);
        let last = run.path.last().unwrap();
        assert_eq!(Cell::new(last.x, last.y), Cell::new(0, 0));
    }

    #[test]
    fn same_seed_gives_identical_runs() {
        let run = |seed: u64| {
            let cost = CostSurface::open(8, 8);
            let entrances = vec![vec![Cell::new(7, 7), Cell::new(7, 6)]];
            let exits = vec![vec![Cell::new(0, 0)]];
            let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
            let mut sim = Simulation::new(
                cost,
                fields,
                SimConfig {
                    seed,
                    ..SimConfig::default()
                },
            );
            for i in 0..4 {
                sim.spawn_pedestrian(Cell::new(7, 7 - i), FieldId { entrance: 0, exit: 0 }, 0);
            }
            sim.run_until_idle(300);
            sim.completed()
                .iter()
                .map(|r| r.path.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn arrivals_spawn_agents_each_tick() {
        let cost = CostSurface::open(10, 10);
        let entrances = vec![vec![
            Cell::new(9, 3),
            Cell::new(9, 4),
            Cell::new(9, 5),
            Cell::new(9, 6),
        ]];
        let exits = vec![vec![Cell::new(0, 4), Cell::new(0, 5)]];
        let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
        let mut sim = Simulation::new(cost, fields, SimConfig::default());

        let geometry = EntranceExits { entrances, exits };
        // Cutoff 0 → exactly one arrival per tick.
        let plan = ArrivalPlan::uniform(1, 1).with_frequency_cutoff(0.0);
        sim.attach_arrivals(geometry, plan);

        sim.run(5);
        assert_eq!(sim.population() + sim.completed().len(), 5);
    }

    #[test]
    fn blocked_wall_forces_detour() {
        // Corridor with a wall; gap at the bottom row.
        let mut grid = Grid::filled(9, 9, 0.0);
        for y in 0..8 {
            grid.set(Cell::new(4, y), 1.0);
        }
        let cost = CostSurface::from_grid(grid);
        let entrances = vec![vec![Cell::new(8, 0)]];
        let exits = vec![vec![Cell::new(0, 0)]];
        let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
        let mut sim = Simulation::new(cost, fields, SimConfig::default());

        sim.spawn_pedestrian(Cell::new(8, 0), FieldId { entrance: 0, exit: 0 }, 0);
        sim.run_until_idle(500);

        assert_eq!(sim.completed().len(), 1);
        let path = &sim.completed()[0].path;
        // The agent reached the exit without ever standing on the wall, and
        // the detour dipped into the gap region at the bottom of the hall.
        assert!(path.iter().all(|s| sim.cost().is_passable(Cell::new(s.x, s.y))));
        assert!(path.iter().any(|s| s.y >= 6));
        let last = path.last().unwrap();
        assert_eq!(Cell::new(last.x, last.y), Cell::new(0, 0));
    }
}
