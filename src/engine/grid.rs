//! The square-cell arena.
//!
//! A [`Grid`] holds 64 [`Cell`]s indexed by [`Square`]. Each cell knows its
//! occupant (by [`PieceId`]) and, per side, which pieces currently attack it.
//! Occupancy is only ever changed through the board's place/remove primitive,
//! which keeps the piece arena pointing back at the same square.

use std::ops::{Index, IndexMut};

use crate::engine::types::{Color, PieceId, Shade, Square};

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One square of the board as seen by the engine and by renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub square: Square,
    pub shade: Shade,
    pub occupant: Option<PieceId>,
    /// Pieces attacking this cell, indexed by [`Color::index`].
    pub targeting: [Vec<PieceId>; 2],
    /// UI selection flag.
    pub selected: bool,
}

impl Cell {
    pub fn new(square: Square) -> Self {
        Cell {
            square,
            shade: square.shade(),
            occupant: None,
            targeting: [Vec::new(), Vec::new()],
            selected: false,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// Pieces of `color` attacking this cell.
    #[inline]
    pub fn attackers(&self, color: Color) -> &[PieceId] {
        &self.targeting[color.index()]
    }

    #[inline]
    pub fn is_attacked_by(&self, color: Color) -> bool {
        !self.targeting[color.index()].is_empty()
    }

    pub fn select(&mut self) {
        self.selected = true;
    }

    pub fn deselect(&mut self) {
        self.selected = false;
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// All 64 cells, a1 first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            cells: Square::all().map(Cell::new).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Occupant of `sq`, if any.
    #[inline]
    pub fn occupant(&self, sq: Square) -> Option<PieceId> {
        self.cells[sq.index()].occupant
    }

    /// Drop every targeting entry ahead of a full recompute.
    pub fn clear_targeting(&mut self) {
        for cell in &mut self.cells {
            cell.targeting[0].clear();
            cell.targeting[1].clear();
        }
    }

    pub fn clear_selection(&mut self) {
        for cell in &mut self.cells {
            cell.deselect();
        }
    }

    /// The currently selected cell, if any.
    pub fn selected(&self) -> Option<Square> {
        self.cells.iter().find(|c| c.selected).map(|c| c.square)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Square> for Grid {
    type Output = Cell;

    fn index(&self, sq: Square) -> &Cell {
        &self.cells[sq.index()]
    }
}

impl IndexMut<Square> for Grid {
    fn index_mut(&mut self, sq: Square) -> &mut Cell {
        &mut self.cells[sq.index()]
    }
}
