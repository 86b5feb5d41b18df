//! Game state, legality rules and phase sequencing

use anyhow::{anyhow, ensure, Result};
use tracing::trace;

use std::fmt;

use crate::{
    error::GameError,
    grid::{CellState, Grid, Position},
};

/// The two sides of the game
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, PartialOrd, Ord)]
pub enum PlayerId {
    A,
    B,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::A, PlayerId::B];

    pub fn opponent(self) -> Self {
        match self {
            PlayerId::A => PlayerId::B,
            PlayerId::B => PlayerId::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerId::A => 0,
            PlayerId::B => 1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::A => write!(f, "A"),
            PlayerId::B => write!(f, "B"),
        }
    }
}

/// The sub-step of a turn
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Phase {
    Move,
    Remove,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Move => write!(f, "move"),
            Phase::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Winner(PlayerId),
    /// Neither player has a legal move
    Draw,
}

/// Reverses one `play_move` or `play_removal` on a working copy
#[derive(Copy, Clone, Debug)]
pub(crate) enum Undo {
    Move { player: PlayerId, from: Position },
    Removal { at: Position },
}

/// The authoritative state of one game
///
/// Turns always run Move(p) -> Remove(p) -> Move(opponent) -> Remove(opponent) ...
/// and the only public mutators are [`apply_move`](GameState::apply_move) and
/// [`apply_removal`](GameState::apply_removal).
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct GameState {
    grid: Grid,
    positions: [Position; 2],
    phase: Phase,
    to_move: PlayerId,
    moves_made: usize,
    cells_removed: usize,
}

impl GameState {
    /// Creates a board of the given size with player A to move
    ///
    /// Player A starts on the top edge at column `cols / 2`, player B on the
    /// bottom edge at column `(cols - 1) / 2`; for the default 8x6 board these
    /// are (0, 3) and (7, 2).
    pub fn new(rows: usize, cols: usize) -> Result<Self, GameError> {
        Self::with_first_player(rows, cols, PlayerId::A)
    }

    pub fn with_first_player(rows: usize, cols: usize, first: PlayerId) -> Result<Self, GameError> {
        if rows < 2 || cols < 1 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        Ok(Self::build(rows, cols, first))
    }

    /// The default 8x6 board with player A to move
    pub fn standard() -> Self {
        Self::standard_with_first_player(PlayerId::A)
    }

    pub fn standard_with_first_player(first: PlayerId) -> Self {
        Self::build(crate::DEFAULT_ROWS, crate::DEFAULT_COLS, first)
    }

    fn build(rows: usize, cols: usize, first: PlayerId) -> Self {
        let mut grid = Grid::new(rows, cols);
        let start_a = Position::new(0, cols / 2);
        let start_b = Position::new(rows - 1, (cols - 1) / 2);
        grid.place(start_a, PlayerId::A);
        grid.place(start_b, PlayerId::B);
        Self {
            grid,
            positions: [start_a, start_b],
            phase: Phase::Move,
            to_move: first,
            moves_made: 0,
            cells_removed: 0,
        }
    }

    /// Builds a Move-phase state from a text layout, one string per row
    ///
    /// `.` is an empty cell, `#` a removed cell, `A` and `B` the players' tokens.
    pub fn from_layout<S: AsRef<str>>(layout: &[S], to_move: PlayerId) -> Result<Self> {
        let rows = layout.len();
        let cols = layout.first().map(|row| row.as_ref().chars().count()).unwrap_or(0);
        ensure!(rows * cols >= 2, "layout must contain at least two cells");

        let mut grid = Grid::new(rows, cols);
        let mut found: [Option<Position>; 2] = [None, None];
        let mut cells_removed = 0;

        for (row, line) in layout.iter().enumerate() {
            let line = line.as_ref();
            ensure!(
                line.chars().count() == cols,
                "row {} has {} cells, expected {}",
                row,
                line.chars().count(),
                cols
            );
            for (col, symbol) in line.chars().enumerate() {
                let position = Position::new(row, col);
                let cell = match symbol {
                    '.' => CellState::Empty,
                    '#' => {
                        cells_removed += 1;
                        CellState::Removed
                    }
                    'A' | 'B' => {
                        let player = if symbol == 'A' { PlayerId::A } else { PlayerId::B };
                        ensure!(
                            found[player.index()].replace(position).is_none(),
                            "player {} appears more than once",
                            player
                        );
                        CellState::Occupied(player)
                    }
                    _ => return Err(anyhow!("could not parse '{}' as a cell", symbol)),
                };
                grid.set(position, cell);
            }
        }

        let position_a = found[0].ok_or_else(|| anyhow!("layout has no player A"))?;
        let position_b = found[1].ok_or_else(|| anyhow!("layout has no player B"))?;

        Ok(Self {
            grid,
            positions: [position_a, position_b],
            phase: Phase::Move,
            to_move,
            moves_made: 0,
            cells_removed,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn position(&self, player: PlayerId) -> Position {
        self.positions[player.index()]
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The player whose action is expected next
    pub fn to_move(&self) -> PlayerId {
        self.to_move
    }

    pub fn moves_made(&self) -> usize {
        self.moves_made
    }

    pub fn cells_removed(&self) -> usize {
        self.cells_removed
    }

    /// The player to act, or `WrongPhase` if the state is not in `phase`
    pub fn acting_player(&self, phase: Phase) -> Result<PlayerId, GameError> {
        if self.phase != phase {
            return Err(GameError::WrongPhase {
                to_move: self.to_move,
                expected: phase,
                actual: self.phase,
            });
        }
        Ok(self.to_move)
    }

    pub fn is_within_bounds(&self, row: usize, col: usize) -> bool {
        self.grid.is_within_bounds(row, col)
    }

    pub fn cell_state(&self, row: usize, col: usize) -> Result<CellState, GameError> {
        self.grid.cell_state(row, col)
    }

    /// True iff `(row, col)` is on the board, empty, and a king step away from the player
    pub fn is_legal_move(&self, player: PlayerId, row: usize, col: usize) -> bool {
        let target = Position::new(row, col);
        self.is_within_bounds(row, col)
            && self.grid.at(target).is_empty()
            && self.position(player).chebyshev(target) == 1
    }

    /// True iff `(row, col)` is on the board and empty
    pub fn is_legal_removal(&self, row: usize, col: usize) -> bool {
        self.is_within_bounds(row, col) && self.grid.at(Position::new(row, col)).is_empty()
    }

    /// The cells the player could step to, in row-major neighbour order
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Position> {
        self.grid
            .neighbours(self.position(player))
            .filter(|&p| self.grid.at(p).is_empty())
            .collect()
    }

    /// Number of legal moves, without allocating
    pub fn mobility(&self, player: PlayerId) -> usize {
        self.grid
            .neighbours(self.position(player))
            .filter(|&p| self.grid.at(p).is_empty())
            .count()
    }

    /// Every empty cell, in row-major order
    pub fn legal_removals(&self) -> Vec<Position> {
        self.grid
            .positions()
            .filter(|&p| self.grid.at(p).is_empty())
            .collect()
    }

    /// Moves the player's token and hands the same player the Remove phase
    pub fn apply_move(
        &mut self,
        player: PlayerId,
        row: usize,
        col: usize,
    ) -> Result<(), GameError> {
        if player != self.to_move {
            return Err(GameError::OutOfTurn {
                player,
                to_move: self.to_move,
                phase: self.phase,
            });
        }
        self.acting_player(Phase::Move)?;
        if !self.is_legal_move(player, row, col) {
            return Err(GameError::IllegalMove {
                player,
                target: Position::new(row, col),
            });
        }
        let from = self.position(player);
        self.play_move(Position::new(row, col));
        trace!(%player, %from, to = %Position::new(row, col), "move applied");
        Ok(())
    }

    /// Removes a cell and hands the opponent the Move phase
    pub fn apply_removal(&mut self, row: usize, col: usize) -> Result<(), GameError> {
        let player = self.acting_player(Phase::Remove)?;
        if !self.is_legal_removal(row, col) {
            return Err(GameError::IllegalRemoval {
                target: Position::new(row, col),
            });
        }
        self.play_removal(Position::new(row, col));
        trace!(%player, at = %Position::new(row, col), "cell removed");
        Ok(())
    }

    /// True iff it is `player`'s move and they have nowhere to go
    pub fn is_terminal(&self, player: PlayerId) -> bool {
        self.phase == Phase::Move && self.to_move == player && self.mobility(player) == 0
    }

    /// The result of the game, once the player to move is stuck
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_terminal(self.to_move) {
            return None;
        }
        let other = self.to_move.opponent();
        if self.mobility(other) == 0 {
            Some(Outcome::Draw)
        } else {
            Some(Outcome::Winner(other))
        }
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome() {
            Some(Outcome::Winner(player)) => Some(player),
            _ => None,
        }
    }

    pub(crate) fn play_move(&mut self, to: Position) -> Undo {
        let player = self.to_move;
        let from = self.positions[player.index()];
        self.grid.vacate(from);
        self.grid.place(to, player);
        self.positions[player.index()] = to;
        self.phase = Phase::Remove;
        self.moves_made += 1;
        Undo::Move { player, from }
    }

    pub(crate) fn play_removal(&mut self, at: Position) -> Undo {
        self.grid.mark_removed(at);
        self.cells_removed += 1;
        self.phase = Phase::Move;
        self.to_move = self.to_move.opponent();
        Undo::Removal { at }
    }

    pub(crate) fn undo(&mut self, undo: Undo) {
        match undo {
            Undo::Move { player, from } => {
                let to = self.positions[player.index()];
                self.grid.vacate(to);
                self.grid.place(from, player);
                self.positions[player.index()] = from;
                self.phase = Phase::Move;
                self.to_move = player;
                self.moves_made -= 1;
            }
            Undo::Removal { at } => {
                self.grid.restore(at);
                self.cells_removed -= 1;
                self.phase = Phase::Remove;
                self.to_move = self.to_move.opponent();
            }
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grid)?;
        write!(f, "{} to {}", self.to_move, self.phase)
    }
}
