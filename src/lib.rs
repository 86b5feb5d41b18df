//! Rules engine and computer players for the board game 'Isolation'
//!
//! Each turn the player to act steps their token to one of the 8 neighbouring
//! empty cells, then permanently removes one empty cell from the board. A player
//! who cannot move on their turn loses.
//!
//! Two engines pick moves: a minimax [`Solver`](solver::Solver) with alpha-beta
//! pruning and iterative deepening under a time budget, and a Monte Carlo
//! tree search ([`Mcts`](mcts::Mcts)).
//!
//! # Basic Usage
//!
//! ```
//! use isolation_ai::{GameState, PlayerId, Position, SearchConfig, Solver};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut state = GameState::standard();
//! assert_eq!(state.legal_moves(PlayerId::A).len(), 5);
//!
//! let mut solver = Solver::new(SearchConfig::fixed_depth(3).with_seed(1))?;
//! let target = solver.choose_move(&state)?;
//! state.apply_move(PlayerId::A, target.row, target.col)?;
//!
//! let removal = solver.choose_removal(&state)?;
//! state.apply_removal(removal.row, removal.col)?;
//! assert_eq!(state.to_move(), PlayerId::B);
//! assert_ne!(state.position(PlayerId::A), Position::new(0, 3));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod error;

pub mod grid;

pub mod state;

pub mod heuristics;

pub mod removal;

pub mod config;

pub mod observer;

pub mod solver;

pub mod mcts;

pub mod player;

pub mod game;

mod test;

pub use config::{HeuristicWeights, MctsConfig, RolloutPolicy, SearchConfig};
pub use error::GameError;
pub use game::Game;
pub use grid::{CellState, Grid, Position};
pub use mcts::Mcts;
pub use player::{EngineConfig, InputSource, Player, PlayerKind};
pub use solver::Solver;
pub use state::{GameState, Outcome, Phase, PlayerId};

/// The default number of board rows
pub const DEFAULT_ROWS: usize = 8;

/// The default number of board columns
pub const DEFAULT_COLS: usize = 6;

// the two starting cells sit on opposite edges, which needs at least two rows
const_assert!(DEFAULT_ROWS >= 2);
const_assert!(DEFAULT_COLS >= 1);
