//! Concourse Headless Simulation Harness
//!
//! Validates the navigation engine against a JSON scenario without any
//! rendering or file-output collaborators. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p concourse-simtest
//!   cargo run -p concourse-simtest -- --verbose

use concourse_core::arrivals::{ArrivalPlan, EntranceExits};
use concourse_core::fields::FieldSet;
use concourse_core::{SimConfig, Simulation};
use concourse_logic::cost::CostSurface;
use concourse_logic::gradient::OBSTACLE;
use concourse_logic::grid::{Cell, Grid};
use concourse_logic::sight;
use concourse_logic::speed;
use serde::Deserialize;

// ── Scenario (same JSON a host harness would feed the engine) ───────────
const SCENARIO_JSON: &str = include_str!("../../../data/concourse_hall.json");

#[derive(Debug, Clone, Copy, Deserialize)]
struct Rect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl Rect {
    fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for dy in 0..self.h {
            for dx in 0..self.w {
                cells.push(Cell::new(self.x + dx, self.y + dy));
            }
        }
        cells
    }
}

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    width: i32,
    height: i32,
    obstacles: Vec<Rect>,
    entrances: Vec<Rect>,
    exits: Vec<Rect>,
    ticks: u64,
    seed: u64,
}

impl Scenario {
    fn cost_surface(&self) -> CostSurface {
        let mut grid = Grid::filled(self.width, self.height, 0.0);
        for rect in &self.obstacles {
            for cell in rect.cells() {
                grid.set(cell, 1.0);
            }
        }
        CostSurface::from_grid(grid)
    }

    fn geometry(&self) -> EntranceExits {
        EntranceExits {
            entrances: self.entrances.iter().map(|r| r.cells()).collect(),
            exits: self.exits.iter().map(|r| r.cells()).collect(),
        }
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn result(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Concourse Simulation Harness ===\n");

    let mut results = Vec::new();

    let scenario: Scenario = match serde_json::from_str(SCENARIO_JSON) {
        Ok(s) => s,
        Err(e) => {
            println!("✗ scenario_parse: {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "Scenario: {} ({}×{}, {} entrance(s), {} exit(s))\n",
        scenario.name,
        scenario.width,
        scenario.height,
        scenario.entrances.len(),
        scenario.exits.len()
    );

    // 1. Cost surface sanity
    results.extend(validate_surface(&scenario));

    // 2. Gradient field properties
    results.extend(validate_fields(&scenario));

    // 3. Line-of-sight behavior
    results.extend(validate_sight(&scenario));

    // 4. Live crowd run
    results.extend(validate_run(&scenario));

    // 5. Determinism
    results.extend(validate_determinism(&scenario));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Cost surface ─────────────────────────────────────────────────────

fn validate_surface(scenario: &Scenario) -> Vec<TestResult> {
    println!("--- Cost Surface ---");
    let mut results = Vec::new();
    let cost = scenario.cost_surface();

    let blocked = scenario
        .obstacles
        .iter()
        .flat_map(|r| r.cells())
        .filter(|&c| cost.is_blocked(c))
        .count();
    let obstacle_cells: usize = scenario.obstacles.iter().map(|r| (r.w * r.h) as usize).sum();
    results.push(result(
        "obstacles_blocked",
        blocked == obstacle_cells,
        format!("{}/{} obstacle cells blocked", blocked, obstacle_cells),
    ));

    let doors_clear = scenario
        .entrances
        .iter()
        .chain(&scenario.exits)
        .flat_map(|r| r.cells())
        .all(|c| cost.is_passable(c));
    results.push(result(
        "entrances_exits_passable",
        doors_clear,
        "all entrance/exit cells walkable".into(),
    ));

    results
}

// ── 2. Gradient fields ──────────────────────────────────────────────────

fn validate_fields(scenario: &Scenario) -> Vec<TestResult> {
    println!("--- Gradient Fields ---");
    let mut results = Vec::new();
    let cost = scenario.cost_surface();
    let geometry = scenario.geometry();

    let fields = match FieldSet::build_all(&cost, &geometry.entrances, &geometry.exits, None) {
        Ok(f) => f,
        Err(e) => {
            results.push(result("fields_build", false, format!("{}", e)));
            return results;
        }
    };
    results.push(result(
        "fields_build",
        true,
        format!(
            "{} pairings, global range {}..{}",
            fields.entrance_count() * fields.exit_count(),
            fields.global_min(),
            fields.global_max()
        ),
    ));

    // Exit cells seed their fields at the global minimum.
    let mut exits_at_zero = true;
    for (ext, rect) in scenario.exits.iter().enumerate() {
        let field = fields.field(concourse_core::FieldId { entrance: 0, exit: ext });
        for cell in rect.cells() {
            if field.value(cell) != Some(0) {
                exits_at_zero = false;
            }
        }
    }
    results.push(result(
        "exits_at_zero",
        exits_at_zero,
        "every exit cell holds gradient 0".into(),
    ));

    // Field validity: |field[v] - field[u]| ≤ 1 across passable 4-neighbors.
    let field = fields.field(concourse_core::FieldId { entrance: 0, exit: 0 });
    let mut lipschitz = true;
    let mut isolation = true;
    for y in 0..scenario.height {
        for x in 0..scenario.width {
            let cell = Cell::new(x, y);
            if cost.is_blocked(cell) {
                if field.raw(cell) != Some(OBSTACLE) {
                    isolation = false;
                }
                continue;
            }
            let Some(v) = field.value(cell) else { continue };
            for n in cell.orthogonal() {
                if let Some(u) = field.value(n) {
                    if (v - u).abs() > 1 {
                        lipschitz = false;
                    }
                }
            }
        }
    }
    results.push(result(
        "field_validity",
        lipschitz,
        "adjacent passable cells differ by at most 1".into(),
    ));
    results.push(result(
        "obstacle_isolation",
        isolation,
        "every obstacle cell holds the sentinel".into(),
    ));

    results
}

// ── 3. Line of sight ────────────────────────────────────────────────────

fn validate_sight(scenario: &Scenario) -> Vec<TestResult> {
    println!("--- Line of Sight ---");
    let mut results = Vec::new();
    let cost = scenario.cost_surface();

    // Across the central kiosk: blocked in both directions, with split
    // distances recomposing the segment length within rounding.
    let kiosk = scenario.obstacles[0];
    let a = Cell::new(kiosk.x - 4, kiosk.y + kiosk.h / 2);
    let b = Cell::new(kiosk.x + kiosk.w + 3, kiosk.y + kiosk.h / 2);

    let from_a = sight::obstruction_distance(&cost, a, b);
    let from_b = sight::obstruction_distance(&cost, b, a);
    results.push(result(
        "kiosk_blocks_sight",
        from_a.is_some() && from_b.is_some(),
        format!("obstruction at {:?}/{:?} cells from either end", from_a, from_b),
    ));

    if let (Some(da), Some(db)) = (from_a, from_b) {
        let segment = a.distance(b) as u32;
        let recomposed = da + db + kiosk.w as u32 - 1;
        let consistent = recomposed >= segment.saturating_sub(1) && recomposed <= segment + 1;
        results.push(result(
            "sight_symmetry",
            consistent,
            format!("{} + {} + kiosk ≈ {} segment", da, db, segment),
        ));
    }

    let along_edge = sight::obstruction_distance(
        &cost,
        Cell::new(1, scenario.height - 2),
        Cell::new(scenario.width - 2, scenario.height - 2),
    );
    results.push(result(
        "open_row_clear",
        along_edge.is_none(),
        "bottom corridor has clear sight".into(),
    ));

    results
}

// ── 4. Live run ─────────────────────────────────────────────────────────

fn validate_run(scenario: &Scenario) -> Vec<TestResult> {
    println!("--- Live Run ---");
    let mut results = Vec::new();
    let cost = scenario.cost_surface();
    let geometry = scenario.geometry();

    let fields = match FieldSet::build_all(&cost, &geometry.entrances, &geometry.exits, None) {
        Ok(f) => f,
        Err(e) => {
            results.push(result("run_setup", false, format!("{}", e)));
            return results;
        }
    };
    let global_min = fields.global_min();

    let mut sim = Simulation::new(
        cost,
        fields,
        SimConfig {
            seed: scenario.seed,
            start_keeping_records: 0,
            ..SimConfig::default()
        },
    );
    let plan = ArrivalPlan::uniform(geometry.entrances.len(), geometry.exits.len());
    sim.attach_arrivals(geometry, plan);

    sim.run(scenario.ticks);

    let live = sim.population();
    let exited = sim.completed().len();
    results.push(result(
        "pedestrians_flow",
        live + exited > 0 && exited > 0,
        format!("{} live, {} exited after {} ticks", live, exited, scenario.ticks),
    ));

    let all_at_exits = sim.completed().iter().all(|run| {
        run.path.last().is_some_and(|s| {
            let cell = Cell::new(s.x, s.y);
            (0..sim.fields().exit_count()).any(|ext| {
                (0..sim.fields().entrance_count()).any(|ent| {
                    sim.fields()
                        .field(concourse_core::FieldId { entrance: ent, exit: ext })
                        .value(cell)
                        == Some(global_min)
                })
            })
        })
    });
    results.push(result(
        "archived_paths_end_at_exits",
        all_at_exits,
        "every archived path terminates on a minimum-gradient cell".into(),
    ));

    let paths_walkable = sim
        .completed()
        .iter()
        .flat_map(|run| &run.path)
        .all(|s| sim.cost().is_passable(Cell::new(s.x, s.y)));
    results.push(result(
        "paths_stay_walkable",
        paths_walkable,
        "no archived path stands on an obstacle".into(),
    ));

    match sim.summary() {
        Some(summary) => {
            let speeds_sane = summary.min_speed >= 0.0
                && summary.max_speed <= speed::MAX_SPEED + 1e-9
                && summary.avg_density > 0.0;
            results.push(result(
                "ewma_ranges",
                speeds_sane,
                format!(
                    "speed {:.2}..{:.2} m/s (avg {:.2}), density avg {:.2} m²/ped",
                    summary.min_speed, summary.max_speed, summary.avg_speed, summary.avg_density
                ),
            ));
        }
        None => {
            results.push(result(
                "ewma_ranges",
                exited > 0,
                "population empty; everyone already exited".into(),
            ));
        }
    }

    let avg = sim.totals().average_walking_speed();
    results.push(result(
        "average_walking_speed",
        avg >= 0.0 && avg <= speed::MAX_SPEED + 1e-9,
        format!("{:.3} m/s over {} recorded steps", avg, sim.totals().recorded_steps),
    ));

    results
}

// ── 5. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(scenario: &Scenario) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();

    let run_once = || -> Option<Vec<Vec<(i32, i32, u64)>>> {
        let cost = scenario.cost_surface();
        let geometry = scenario.geometry();
        let fields =
            FieldSet::build_all(&cost, &geometry.entrances, &geometry.exits, None).ok()?;
        let mut sim = Simulation::new(
            cost,
            fields,
            SimConfig {
                seed: scenario.seed,
                ..SimConfig::default()
            },
        );
        let plan = ArrivalPlan::uniform(geometry.entrances.len(), geometry.exits.len());
        sim.attach_arrivals(geometry, plan);
        sim.run(scenario.ticks);
        Some(
            sim.completed()
                .iter()
                .map(|r| r.path.iter().map(|s| (s.x, s.y, s.tick)).collect())
                .collect(),
        )
    };

    match (run_once(), run_once()) {
        (Some(first), Some(second)) => {
            results.push(result(
                "seeded_runs_identical",
                first == second,
                format!("{} archived paths compared", first.len()),
            ));
        }
        _ => {
            results.push(result("seeded_runs_identical", false, "setup failed".into()));
        }
    }

    results
}
