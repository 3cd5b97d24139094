//! A single grid slot

use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::Token;

/// Grid coordinates. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Step by a signed delta, `None` when leaving the non-negative quadrant
    pub fn offset(self, dx: isize, dy: isize) -> Option<Pos> {
        Some(Pos {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// One grid slot: occupant, spawn preview and selection flag.
///
/// A cell never holds a preview while occupied. Equality compares
/// coordinates only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pos: Pos,
    occupant: Option<Token>,
    incoming: Option<Token>,
    selected: bool,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self {
            pos: Pos::new(x, y),
            occupant: None,
            incoming: None,
            selected: false,
        }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn occupant(&self) -> Option<Token> {
        self.occupant
    }

    pub fn incoming(&self) -> Option<Token> {
        self.incoming
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Set or remove the occupant. Placing a token clears the preview.
    pub fn set_occupant(&mut self, token: Option<Token>) {
        if token.is_some() {
            self.incoming = None;
        }
        self.occupant = token;
    }

    /// Set the spawn preview; ignored while occupied
    pub fn set_incoming(&mut self, token: Option<Token>) {
        self.incoming = if self.is_empty() { token } else { None };
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Remove occupant and selection
    pub fn clear(&mut self) {
        self.occupant = None;
        self.selected = false;
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl Eq for Cell {}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pos.fmt(f)
    }
}
