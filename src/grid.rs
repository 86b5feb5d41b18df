//! The board: a rectangular matrix of cells and its mutation primitives

use std::fmt;

use crate::{error::GameError, state::PlayerId};

/// Offsets of the 8 Chebyshev neighbours of a cell, row-major
pub const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CellState {
    Empty,
    Occupied(PlayerId),
    Removed,
}

impl CellState {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellState::Empty)
    }

    pub fn symbol(&self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Occupied(PlayerId::A) => 'A',
            CellState::Occupied(PlayerId::B) => 'B',
            CellState::Removed => '#',
        }
    }
}

/// A (row, column) cell coordinate
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the position shifted by the given offset, or `None` if it
    /// would leave the non-negative quadrant
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }

    /// Chebyshev (king-move) distance between two cells
    pub fn chebyshev(self, other: Self) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Cell storage for a `rows` x `cols` board
///
/// The grid itself only stores cell states, it does not know whose turn it is
/// or whether a mutation is legal. `GameState` owns that bookkeeping.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Grid {
    // cells are stored row by row, top-to-bottom
    cells: Vec<CellState>,
    rows: usize,
    cols: usize,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![CellState::Empty; rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_within_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Returns the state of a cell, or `OutOfBounds` for coordinates off the board
    pub fn cell_state(&self, row: usize, col: usize) -> Result<CellState, GameError> {
        if !self.is_within_bounds(row, col) {
            return Err(GameError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.cells[row * self.cols + col])
    }

    /// Unchecked lookup for positions already known to be on the board
    pub(crate) fn at(&self, position: Position) -> CellState {
        self.cells[position.row * self.cols + position.col]
    }

    /// Iterates the on-board neighbours of a cell
    pub fn neighbours(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOUR_OFFSETS.iter().filter_map(move |&(d_row, d_col)| {
            position
                .offset(d_row, d_col)
                .filter(|p| self.is_within_bounds(p.row, p.col))
        })
    }

    /// Iterates every position on the board in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let cols = self.cols;
        (0..self.rows * cols).map(move |idx| Position::new(idx / cols, idx % cols))
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&cell| cell == state).count()
    }

    /// Puts a player's token on an empty cell
    pub(crate) fn place(&mut self, position: Position, player: PlayerId) {
        debug_assert!(self.at(position).is_empty());
        self.set(position, CellState::Occupied(player));
    }

    /// Lifts a token off a cell, leaving it empty
    pub(crate) fn vacate(&mut self, position: Position) {
        debug_assert!(matches!(self.at(position), CellState::Occupied(_)));
        self.set(position, CellState::Empty);
    }

    /// Permanently disables an empty cell
    pub(crate) fn mark_removed(&mut self, position: Position) {
        debug_assert!(self.at(position).is_empty());
        self.set(position, CellState::Removed);
    }

    /// Turns a removed cell back into an empty one.
    ///
    /// Only search undo may call this; the authoritative game never reverts a removal.
    pub(crate) fn restore(&mut self, position: Position) {
        debug_assert_eq!(self.at(position), CellState::Removed);
        self.set(position, CellState::Empty);
    }

    /// Raw write used while building a board from a layout
    pub(crate) fn set(&mut self, position: Position, state: CellState) {
        let idx = position.row * self.cols + position.col;
        self.cells[idx] = state;
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.cols) {
            let line: String = row.iter().map(CellState::symbol).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
