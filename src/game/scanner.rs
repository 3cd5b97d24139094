//! Run detection and popping
//!
//! Every cell that received a token is checked along the four lines through
//! it. Each line is walked once from its edge, so runs anywhere on the line are
//! found, including several separate runs on the same line.

use serde::{Deserialize, Serialize};

use super::cell::Pos;
use super::grid::Grid;

/// Line orientation through a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Left to right
    Row,
    /// Top to bottom
    Column,
    /// Top-left to bottom-right (↘)
    Diagonal,
    /// Bottom-left to top-right (↗)
    AntiDiagonal,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Row,
        Direction::Column,
        Direction::Diagonal,
        Direction::AntiDiagonal,
    ];

    /// Coordinate delta for one step along the line
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Row => (1, 0),
            Direction::Column => (0, 1),
            Direction::Diagonal => (1, 1),
            Direction::AntiDiagonal => (1, -1),
        }
    }

    /// First cell of the line through `pos`, on the grid edge
    pub fn line_start(self, pos: Pos, size: usize) -> Pos {
        match self {
            Direction::Row => Pos::new(0, pos.y),
            Direction::Column => Pos::new(pos.x, 0),
            Direction::Diagonal => {
                let back = pos.x.min(pos.y);
                Pos::new(pos.x - back, pos.y - back)
            }
            Direction::AntiDiagonal => {
                let back = pos.x.min(size.saturating_sub(1).saturating_sub(pos.y));
                Pos::new(pos.x - back, pos.y + back)
            }
        }
    }
}

/// Flags runs on one grid and removes them
#[derive(Debug, Clone)]
pub struct RunScanner {
    size: usize,
    min_len: usize,
    /// Cells flagged for removal, row-major
    mask: Vec<bool>,
}

impl RunScanner {
    pub fn new(size: usize, min_len: usize) -> Self {
        Self {
            size,
            min_len: min_len.max(1),
            mask: vec![false; size * size],
        }
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Drop all flags and follow a grid resize
    pub fn resize(&mut self, size: usize) {
        self.size = size;
        self.mask = vec![false; size * size];
    }

    pub fn is_flagged(&self, pos: Pos) -> bool {
        pos.x < self.size && pos.y < self.size && self.mask[pos.y * self.size + pos.x]
    }

    pub fn flagged_count(&self) -> usize {
        self.mask.iter().filter(|&&f| f).count()
    }

    /// Flag runs on the row, column and both diagonals through `pos`
    pub fn scan_from_cell(&mut self, grid: &Grid, pos: Pos) {
        if grid.size() != self.size {
            self.resize(grid.size());
        }
        for dir in Direction::ALL {
            let start = dir.line_start(pos, self.size);
            self.scan_line(grid, start, dir);
        }
    }

    fn scan_line(&mut self, grid: &Grid, start: Pos, dir: Direction) {
        let (dx, dy) = dir.step();
        let mut line = Vec::with_capacity(self.size);
        let mut cursor = Some(start);
        while let Some(p) = cursor.filter(|p| p.x < self.size && p.y < self.size) {
            line.push(p);
            cursor = p.offset(dx, dy);
        }
        if line.len() < self.min_len {
            return;
        }

        let mut run_start = 0;
        let mut run_len = 0;
        let mut run_token = None;
        for (i, &p) in line.iter().enumerate() {
            let token = grid.occupant(p);
            if token.is_some() && token == run_token {
                run_len += 1;
                continue;
            }
            self.flag_run(&line[run_start..run_start + run_len]);
            run_token = token;
            run_start = i;
            run_len = usize::from(token.is_some());
        }
        self.flag_run(&line[run_start..run_start + run_len]);
    }

    fn flag_run(&mut self, run: &[Pos]) {
        if run.len() < self.min_len {
            return;
        }
        log::debug!("Run of {} from {} flagged", run.len(), run[0]);
        for p in run {
            self.mask[p.y * self.size + p.x] = true;
        }
    }

    /// Remove flagged tokens and reset the mask. Returns the number removed.
    pub fn pop(&mut self, grid: &mut Grid) -> usize {
        let mut popped = 0;
        for y in 0..self.size {
            for x in 0..self.size {
                let i = y * self.size + x;
                if !self.mask[i] {
                    continue;
                }
                self.mask[i] = false;
                if grid.take(Pos::new(x, y)).is_some() {
                    popped += 1;
                }
            }
        }
        popped
    }

    /// Check every queued cell, then pop. Returns the number removed.
    pub fn pop_lines(&mut self, grid: &mut Grid) -> usize {
        while let Some(pos) = grid.pop_spawned() {
            self.scan_from_cell(grid, pos);
        }
        let popped = self.pop(grid);
        if popped > 0 {
            log::debug!("Popped {} tokens", popped);
        }
        popped
    }
}
