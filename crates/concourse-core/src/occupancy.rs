//! Cell → agents spatial index.
//!
//! Mutated on every agent move and queried constantly during target search
//! and movement selection. Single-threaded: the scheduler guarantees
//! non-reentrant stepping, so no locking is needed.

use std::collections::HashMap;

use concourse_logic::grid::Cell;
use hecs::Entity;

/// Maps occupied cells to the agents standing on them.
#[derive(Debug, Default)]
pub struct OccupancyIndex {
    cells: HashMap<(i32, i32), Vec<Entity>>,
    total: usize,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent: Entity, cell: Cell) {
        self.cells.entry((cell.x, cell.y)).or_default().push(agent);
        self.total += 1;
    }

    /// Detach an agent from a cell. Returns `false` if it was not there.
    pub fn remove(&mut self, agent: Entity, cell: Cell) -> bool {
        let key = (cell.x, cell.y);
        if let Some(agents) = self.cells.get_mut(&key) {
            if let Some(i) = agents.iter().position(|&a| a == agent) {
                agents.swap_remove(i);
                if agents.is_empty() {
                    self.cells.remove(&key);
                }
                self.total -= 1;
                return true;
            }
        }
        false
    }

    /// Move an agent between cells.
    pub fn relocate(&mut self, agent: Entity, from: Cell, to: Cell) {
        if from == to {
            return;
        }
        if self.remove(agent, from) {
            self.insert(agent, to);
        }
    }

    pub fn agents_at(&self, cell: Cell) -> &[Entity] {
        self.cells
            .get(&(cell.x, cell.y))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn count_at(&self, cell: Cell) -> usize {
        self.agents_at(cell).len()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.count_at(cell) > 0
    }

    /// True when someone other than `agent` stands on the cell.
    pub fn is_occupied_by_other(&self, cell: Cell, agent: Entity) -> bool {
        self.agents_at(cell).iter().any(|&a| a != agent)
    }

    /// Total occupants across a set of cells.
    pub fn count_in(&self, cells: &[Cell]) -> usize {
        cells.iter().map(|&c| self.count_at(c)).sum()
    }

    /// Number of agents currently indexed.
    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = hecs::World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    #[test]
    fn insert_query_remove() {
        let e = entities(2);
        let mut occ = OccupancyIndex::new();
        let cell = Cell::new(3, 4);

        occ.insert(e[0], cell);
        occ.insert(e[1], cell);
        assert_eq!(occ.count_at(cell), 2);
        assert_eq!(occ.total(), 2);

        assert!(occ.remove(e[0], cell));
        assert!(!occ.remove(e[0], cell));
        assert_eq!(occ.count_at(cell), 1);
        assert_eq!(occ.total(), 1);
    }

    #[test]
    fn relocate_moves_between_cells() {
        let e = entities(1);
        let mut occ = OccupancyIndex::new();
        let a = Cell::new(0, 0);
        let b = Cell::new(1, 0);

        occ.insert(e[0], a);
        occ.relocate(e[0], a, b);
        assert!(!occ.is_occupied(a));
        assert!(occ.is_occupied(b));
        assert_eq!(occ.total(), 1);
    }

    #[test]
    fn occupied_by_other_ignores_self() {
        let e = entities(2);
        let mut occ = OccupancyIndex::new();
        let cell = Cell::new(2, 2);

        occ.insert(e[0], cell);
        assert!(!occ.is_occupied_by_other(cell, e[0]));
        assert!(occ.is_occupied_by_other(cell, e[1]));
    }

    #[test]
    fn count_in_sums_neighborhood() {
        let e = entities(3);
        let mut occ = OccupancyIndex::new();
        occ.insert(e[0], Cell::new(0, 0));
        occ.insert(e[1], Cell::new(1, 0));
        occ.insert(e[2], Cell::new(5, 5));

        let cells = [Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)];
        assert_eq!(occ.count_in(&cells), 2);
    }
}
