//! End-to-end navigation scenarios exercising the full engine:
//! field construction → spawn → replan → movement → exit → archive.

use concourse_core::fields::{FieldId, FieldSet};
use concourse_core::{SimConfig, Simulation, StepOutcome};
use concourse_logic::cost::CostSurface;
use concourse_logic::grid::{Cell, Grid};
use concourse_logic::neighborhood::Neighborhood;

fn field_id() -> FieldId {
    FieldId { entrance: 0, exit: 0 }
}

fn open_5x5() -> Simulation {
    let cost = CostSurface::open(5, 5);
    let entrances = vec![vec![Cell::new(4, 4)]];
    let exits = vec![vec![Cell::new(0, 0)]];
    let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
    Simulation::new(cost, fields, SimConfig::default())
}

#[test]
fn five_by_five_flood_fill_matches_expected_values() {
    let sim = open_5x5();
    let field = sim.fields().field(field_id());

    assert_eq!(field.value(Cell::new(0, 0)), Some(0));
    assert_eq!(field.value(Cell::new(1, 0)), Some(1));
    assert_eq!(field.value(Cell::new(0, 1)), Some(1));
    assert_eq!(field.value(Cell::new(2, 0)), Some(2));
    assert_eq!(field.value(Cell::new(1, 1)), Some(2));
    assert_eq!(field.value(Cell::new(0, 2)), Some(2));
    assert_eq!(field.value(Cell::new(4, 4)), Some(8));
}

#[test]
fn first_tick_replans_and_closes_in() {
    let mut sim = open_5x5();
    let start = Cell::new(4, 4);
    let agent = sim.spawn_pedestrian(start, field_id(), 0);

    // Target is initialized to the spawn cell, so the very first active
    // step must replan, pick a visible minimum-gradient cell, and move at
    // least one Manhattan step closer to the exit.
    let outcome = sim.step_entity(agent);
    let StepOutcome::Moved { from, to } = outcome else {
        panic!("expected Moved on the first tick, got {:?}", outcome);
    };
    assert_eq!(from, start);
    assert!(to.manhattan(Cell::new(0, 0)) <= start.manhattan(Cell::new(0, 0)) - 1);

    let ped = sim.pedestrian(agent).unwrap();
    assert_ne!(ped.target, start);
    let field = sim.fields().field(field_id());
    assert!(field.value(ped.target).unwrap() < field.value(start).unwrap());
}

#[test]
fn exit_removal_is_synchronous_and_archived() {
    let mut sim = open_5x5();
    let agent = sim.spawn_pedestrian(Cell::new(0, 0), field_id(), 0);

    // Drive through the scheduler so the spawn-time entry is consumed.
    sim.step_tick();

    assert_eq!(sim.population(), 0);
    assert!(sim.pedestrian(agent).is_none());

    let runs = sim.completed();
    assert_eq!(runs.len(), 1);
    assert!(!runs[0].path.is_empty());
    assert_eq!(runs[0].ticks_taken, 0);
    // No further scheduled steps for the exited agent.
    assert_eq!(sim.scheduled_steps(), 0);
}

#[test]
fn crowd_drains_through_a_doorway() {
    // A 12×8 room with a one-cell doorway on the left wall.
    let mut grid = Grid::filled(12, 8, 0.0);
    for y in 0..8 {
        if y != 4 {
            grid.set(Cell::new(0, y), 1.0);
        }
    }
    let cost = CostSurface::from_grid(grid);
    let entrances = vec![(1..7).map(|y| Cell::new(10, y)).collect::<Vec<_>>()];
    let exits = vec![vec![Cell::new(0, 4)]];
    let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
    let mut sim = Simulation::new(
        cost,
        fields,
        SimConfig {
            seed: 3,
            ..SimConfig::default()
        },
    );

    for y in 1..7 {
        sim.spawn_pedestrian(Cell::new(10, y), field_id(), 0);
    }
    let spawned = sim.population();
    assert_eq!(spawned, 6);

    sim.run_until_idle(3000);
    assert_eq!(sim.population(), 0, "everyone drains through the doorway");
    assert_eq!(sim.completed().len(), spawned);
    for run in sim.completed() {
        let last = run.path.last().unwrap();
        assert_eq!(Cell::new(last.x, last.y), Cell::new(0, 4));
        // Path ticks are strictly increasing.
        assert!(run.path.windows(2).all(|w| w[0].tick < w[1].tick));
    }
}

#[test]
fn two_pairings_use_their_own_fields() {
    let cost = CostSurface::open(9, 9);
    let entrances = vec![vec![Cell::new(8, 4)]];
    let exits = vec![vec![Cell::new(0, 0)], vec![Cell::new(0, 8)]];
    let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
    let mut sim = Simulation::new(
        cost,
        fields,
        SimConfig {
            seed: 5,
            ..SimConfig::default()
        },
    );

    let a = sim.spawn_pedestrian(Cell::new(8, 4), FieldId { entrance: 0, exit: 0 }, 0);
    sim.run_until_idle(1000);
    assert!(sim.pedestrian(a).is_none());

    let b = sim.spawn_pedestrian(Cell::new(8, 4), FieldId { entrance: 0, exit: 1 }, 0);
    sim.run_until_idle(1000);
    assert!(sim.pedestrian(b).is_none());

    let runs = sim.completed();
    assert_eq!(runs.len(), 2);
    let first_end = runs[0].path.last().unwrap();
    let second_end = runs[1].path.last().unwrap();
    assert_eq!(Cell::new(first_end.x, first_end.y), Cell::new(0, 0));
    assert_eq!(Cell::new(second_end.x, second_end.y), Cell::new(0, 8));
}

#[test]
fn manhattan_neighborhood_still_converges() {
    let cost = CostSurface::open(7, 7);
    let entrances = vec![vec![Cell::new(6, 6)]];
    let exits = vec![vec![Cell::new(0, 0)]];
    let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
    let mut sim = Simulation::new(
        cost,
        fields,
        SimConfig {
            seed: 8,
            neighborhood: Neighborhood::Manhattan,
            ..SimConfig::default()
        },
    );

    sim.spawn_pedestrian(Cell::new(6, 6), field_id(), 0);
    sim.run_until_idle(1000);
    assert_eq!(sim.completed().len(), 1);
}

#[test]
fn trace_grid_records_active_steps() {
    let cost = CostSurface::open(6, 6);
    let entrances = vec![vec![Cell::new(5, 5)]];
    let exits = vec![vec![Cell::new(0, 0)]];
    let fields = FieldSet::build_all(&cost, &entrances, &exits, None).unwrap();
    let mut sim = Simulation::new(
        cost,
        fields,
        SimConfig {
            seed: 2,
            start_keeping_records: 0,
            ..SimConfig::default()
        },
    );

    sim.spawn_pedestrian(Cell::new(5, 5), field_id(), 0);
    sim.run_until_idle(500);

    assert!(sim.trace().count(Cell::new(5, 5)) >= 1.0);
    let totals = sim.totals();
    assert!(totals.distance_traveled > 0.0);
    assert!(totals.recorded_steps > 0);
    let avg = totals.average_walking_speed();
    assert!(avg > 0.0 && avg <= concourse_logic::speed::MAX_SPEED + 1e-9);
}
