//! Error conditions reported by the rules engine and the players

use thiserror::Error;

use crate::{grid::Position, state::Phase, state::PlayerId};

/// Errors returned by state transitions, queries and decision making
///
/// None of these leave the game state modified: every transition either
/// fully applies or reports one of these and changes nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("illegal move for player {player} to {target}")]
    IllegalMove { player: PlayerId, target: Position },

    #[error("illegal removal of cell {target}")]
    IllegalRemoval { target: Position },

    #[error("coordinate ({row}, {col}) is outside the {rows}x{cols} board")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The queried action set is empty. This is a terminal signal, not a crash.
    #[error("player {player} has no legal action")]
    NoLegalAction { player: PlayerId },

    #[error("player {player} cannot act in the {phase} phase of player {to_move}")]
    OutOfTurn {
        player: PlayerId,
        to_move: PlayerId,
        phase: Phase,
    },

    /// The state is between the two sub-steps of a turn in the other order
    #[error("expected the {expected} phase, but player {to_move} is in the {actual} phase")]
    WrongPhase {
        to_move: PlayerId,
        expected: Phase,
        actual: Phase,
    },

    #[error("invalid board dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("input source for player {player} is closed")]
    InputClosed { player: PlayerId },
}
