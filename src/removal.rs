//! Choosing which cell to remove
//!
//! Removing an empty cell costs one legal move to every token standing next to
//! it, so a one-ply lookahead over all removals reduces to two adjacency checks
//! per candidate. Candidates are ranked by:
//!
//! 1. taking a move away from the opponent,
//! 2. not taking a move away from the remover,
//!
//! and the search breaks remaining ties by row-major order (see [`greedy_removal`]).

use std::cmp::Reverse;

use crate::{
    grid::Position,
    state::{GameState, Undo},
};

/// Lower is better
fn removal_key(state: &GameState, at: Position) -> (Reverse<bool>, bool) {
    let remover = state.to_move();
    let hits_opponent = state.position(remover.opponent()).chebyshev(at) == 1;
    let hits_self = state.position(remover).chebyshev(at) == 1;
    (Reverse(hits_opponent), hits_self)
}

/// All removals tied for the best rank, in row-major order
///
/// The remover is the player to act, so this is meant for Remove-phase states.
pub fn best_removals(state: &GameState) -> Vec<Position> {
    let candidates = state.legal_removals();
    let best = match candidates.iter().map(|&at| removal_key(state, at)).min() {
        Some(key) => key,
        None => return candidates,
    };
    candidates
        .into_iter()
        .filter(|&at| removal_key(state, at) == best)
        .collect()
}

/// The first best-ranked removal in row-major order
pub fn greedy_removal(state: &GameState) -> Option<Position> {
    let mut best: Option<(Position, (Reverse<bool>, bool))> = None;
    for at in state.grid().positions() {
        if !state.grid().at(at).is_empty() {
            continue;
        }
        let key = removal_key(state, at);
        // the best possible key, no need to look further
        if key == (Reverse(true), false) {
            return Some(at);
        }
        if best.map_or(true, |(_, best_key)| key < best_key) {
            best = Some((at, key));
        }
    }
    best.map(|(at, _)| at)
}

/// Plays a move followed by the greedy removal, the unit ply of both search engines
pub(crate) fn play_turn(state: &mut GameState, to: Position) -> (Undo, Option<Undo>) {
    let move_undo = state.play_move(to);
    // the vacated cell is always empty, so a removal exists
    let removal_undo = greedy_removal(state).map(|at| state.play_removal(at));
    (move_undo, removal_undo)
}

pub(crate) fn undo_turn(state: &mut GameState, (move_undo, removal_undo): (Undo, Option<Undo>)) {
    if let Some(undo) = removal_undo {
        state.undo(undo);
    }
    state.undo(move_undo);
}
