//! The square game grid
//!
//! Owns every [`Cell`], answers reachability queries through a breadth-first
//! search and keeps track of where the next tokens will spawn.
//!
//! Cells are stored row-major in a flat `Vec` (`y * size + x`).

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cell::{Cell, Pos};
use super::token::Token;

/// Orthogonal neighbor order used by the reachability search: up, right, down, left
const NEIGHBORS: [(isize, isize); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    /// Shared with the session snapshot to detect desynchronized saves
    instance_id: u64,
    size: usize,
    cells: Vec<Cell>,
    /// Spawn slots for the next turn; `None` means no room was left
    incoming: Vec<Option<Pos>>,
    /// Cells that received a token and still need a run check (FIFO)
    spawned: VecDeque<Pos>,
    /// Reachability from the last origin passed to `compute_reachability`
    #[serde(skip)]
    reachable: Vec<bool>,
    #[serde(skip)]
    visited: Vec<bool>,
}

impl Grid {
    /// Create an empty grid with `slots` incoming positions
    pub fn new(size: usize, slots: usize, instance_id: u64) -> Self {
        let size = size.max(1);
        Self {
            instance_id,
            size,
            cells: Self::build_cells(size),
            incoming: vec![None; slots],
            spawned: VecDeque::new(),
            reachable: vec![false; size * size],
            visited: vec![false; size * size],
        }
    }

    fn build_cells(size: usize) -> Vec<Cell> {
        (0..size)
            .flat_map(|y| (0..size).map(move |x| Cell::new(x, y)))
            .collect()
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.x >= self.size || pos.y >= self.size {
            return None;
        }
        Some(pos.y * self.size + pos.x)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn set_instance_id(&mut self, id: u64) {
        self.instance_id = id;
    }

    /// Rebuild every cell for a new side length.
    ///
    /// Reachability, incoming slots and the spawn queue are invalidated.
    pub fn set_size(&mut self, size: usize) {
        let size = size.max(1);
        log::info!("Resizing grid {} -> {}", self.size, size);
        self.size = size;
        self.cells = Self::build_cells(size);
        self.incoming.iter_mut().for_each(|slot| *slot = None);
        self.spawned.clear();
        self.reachable = vec![false; size * size];
        self.visited = vec![false; size * size];
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).and_then(|i| self.cells.get(i))
    }

    /// Whether the cell list, slots and spawn queue agree with `size`.
    /// Only a deserialized grid can fail this.
    pub fn is_consistent(&self) -> bool {
        let in_bounds = |p: &Pos| p.x < self.size && p.y < self.size;
        self.size >= 1
            && self.cells.len() == self.size * self.size
            && self
                .cells
                .iter()
                .enumerate()
                .all(|(i, c)| c.pos() == Pos::new(i % self.size, i / self.size))
            && self.incoming.iter().flatten().all(in_bounds)
            && self.spawned.iter().all(in_bounds)
    }

    pub fn occupant(&self, pos: Pos) -> Option<Token> {
        self.cell(pos).and_then(Cell::occupant)
    }

    pub fn is_empty_at(&self, pos: Pos) -> bool {
        self.cell(pos).is_some_and(Cell::is_empty)
    }

    /// Put a token on a cell and queue it for run checking.
    /// Returns false if out of bounds.
    pub fn place(&mut self, pos: Pos, token: Token) -> bool {
        let Some(i) = self.index(pos) else {
            return false;
        };
        self.cells[i].set_occupant(Some(token));
        self.spawned.push_back(pos);
        true
    }

    /// Remove and return the token on a cell
    pub fn take(&mut self, pos: Pos) -> Option<Token> {
        let i = self.index(pos)?;
        let token = self.cells[i].occupant();
        self.cells[i].set_occupant(None);
        token
    }

    pub fn set_active(&mut self, pos: Pos, active: bool) {
        if let Some(i) = self.index(pos) {
            self.cells[i].set_selected(active);
        }
    }

    /// Remove every token, deselect every cell and drop the spawn queue
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.spawned.clear();
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| !c.is_empty())
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_empty()).count()
    }

    // === Spawn queue ===

    /// Next cell waiting for a run check
    pub fn pop_spawned(&mut self) -> Option<Pos> {
        self.spawned.pop_front()
    }

    pub fn spawned_len(&self) -> usize {
        self.spawned.len()
    }

    // === Reachability ===

    /// Breadth-first search over empty cells starting at the neighbors of `origin`.
    ///
    /// Occupied cells are marked visited but block the search. Results are valid
    /// until the next call or the next token placement.
    pub fn compute_reachability(&mut self, origin: Pos) {
        let n = self.size * self.size;
        self.reachable.clear();
        self.reachable.resize(n, false);
        self.visited.clear();
        self.visited.resize(n, false);

        if self.index(origin).is_none() {
            return;
        }

        let mut queue: VecDeque<Pos> = VecDeque::new();
        self.expand(origin, &mut queue);
        while let Some(current) = queue.pop_front() {
            self.expand(current, &mut queue);
        }
    }

    fn expand(&mut self, from: Pos, queue: &mut VecDeque<Pos>) {
        for (dx, dy) in NEIGHBORS {
            let Some(next) = from.offset(dx, dy) else {
                continue;
            };
            let Some(i) = self.index(next) else {
                continue;
            };
            if self.visited[i] {
                continue;
            }
            self.visited[i] = true;
            if self.cells[i].is_empty() {
                self.reachable[i] = true;
                queue.push_back(next);
            }
        }
    }

    /// Whether `pos` was reachable from the last computed origin
    pub fn is_reachable(&self, pos: Pos) -> bool {
        self.index(pos)
            .and_then(|i| self.reachable.get(i).copied())
            .unwrap_or(false)
    }

    /// Snapshot of the reachability matrix, row-major
    pub fn reachability(&self) -> &[bool] {
        &self.reachable
    }

    // === Incoming positions ===

    /// A uniformly random empty cell, or `None` when the grid is full
    pub fn pick_random_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Pos> {
        let empty: Vec<Pos> = self
            .cells
            .iter()
            .filter(|c| c.is_empty())
            .map(Cell::pos)
            .collect();
        pick(&empty, rng)
    }

    /// A random empty cell that no incoming slot already points at
    pub fn pick_random_available_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Pos> {
        let available: Vec<Pos> = self
            .cells
            .iter()
            .filter(|c| c.is_empty() && !self.incoming.contains(&Some(c.pos())))
            .map(Cell::pos)
            .collect();
        pick(&available, rng)
    }

    /// Wipe all preview flags and draw a fresh position for every slot
    pub fn calculate_incoming_positions<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in &mut self.cells {
            cell.set_incoming(None);
        }
        self.incoming.iter_mut().for_each(|slot| *slot = None);

        for i in 0..self.incoming.len() {
            let pos = self.pick_random_available_empty_cell(rng);
            match pos {
                Some(p) => log::debug!("Incoming position [{}] set to {}", i, p),
                None => log::debug!("No available incoming position for slot [{}]", i),
            }
            self.incoming[i] = pos;
        }
    }

    /// True iff every slot is set and still points at an empty cell
    pub fn incoming_positions_available(&self) -> bool {
        self.incoming
            .iter()
            .all(|slot| slot.is_some_and(|p| self.is_empty_at(p)))
    }

    /// Redraw slots whose cell got filled. Empty slots stay empty.
    pub fn recalculate_incoming_positions<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in 0..self.incoming.len() {
            let Some(pos) = self.incoming[i] else {
                continue;
            };
            if self.is_empty_at(pos) {
                continue;
            }
            let replacement = self.pick_random_available_empty_cell(rng);
            log::debug!("Incoming position {} taken, redrawn as {:?}", pos, replacement);
            self.incoming[i] = replacement;
        }
    }

    pub fn incoming_positions(&self) -> &[Option<Pos>] {
        &self.incoming
    }

    /// Mark the preview token on each slot's cell
    pub fn preview_incoming(&mut self, tokens: &[Token]) {
        for (slot, token) in self.incoming.clone().into_iter().zip(tokens) {
            if let Some(i) = slot.and_then(|p| self.index(p)) {
                self.cells[i].set_incoming(Some(*token));
            }
        }
    }
}

fn pick<R: Rng + ?Sized>(candidates: &[Pos], rng: &mut R) -> Option<Pos> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.random_range(0..candidates.len())])
}
