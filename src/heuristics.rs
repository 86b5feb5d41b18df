//! Static evaluation of positions
//!
//! Every heuristic is a pure function of the state and the player it scores for;
//! any randomness lives in the search layer.

use crate::{config::HeuristicWeights, state::GameState, state::PlayerId};

/// Scores how desirable a state is for `player`, higher is better
pub trait Heuristic: Send + Sync {
    fn evaluate(&self, state: &GameState, player: PlayerId) -> f64;
}

/// Own legal moves minus the opponent's
#[derive(Debug, Clone, Copy, Default)]
pub struct Mobility;

impl Heuristic for Mobility {
    fn evaluate(&self, state: &GameState, player: PlayerId) -> f64 {
        state.mobility(player) as f64 - state.mobility(player.opponent()) as f64
    }
}

/// `1 / (1 + d)` where `d` is the Manhattan distance to the board centre
#[derive(Debug, Clone, Copy, Default)]
pub struct Centrality;

impl Heuristic for Centrality {
    fn evaluate(&self, state: &GameState, player: PlayerId) -> f64 {
        let position = state.position(player);
        let centre_row = (state.rows() - 1) as f64 / 2.0;
        let centre_col = (state.cols() - 1) as f64 / 2.0;
        let distance =
            (position.row as f64 - centre_row).abs() + (position.col as f64 - centre_col).abs();
        1.0 / (1.0 + distance)
    }
}

/// Empty cells among the player's 8 neighbours
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenNeighbors;

impl Heuristic for OpenNeighbors {
    fn evaluate(&self, state: &GameState, player: PlayerId) -> f64 {
        state.mobility(player) as f64
    }
}

/// Weighted sum of [`Mobility`], [`Centrality`] and [`OpenNeighbors`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Composite {
    pub weights: HeuristicWeights,
}

impl Composite {
    pub fn new(weights: HeuristicWeights) -> Self {
        Self { weights }
    }
}

impl Heuristic for Composite {
    fn evaluate(&self, state: &GameState, player: PlayerId) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;
        // skip zero-weight terms so pure-mobility weighting stays cheap
        if w.mobility != 0.0 {
            score += w.mobility * Mobility.evaluate(state, player);
        }
        if w.centrality != 0.0 {
            score += w.centrality * Centrality.evaluate(state, player);
        }
        if w.open_neighbors != 0.0 {
            score += w.open_neighbors * OpenNeighbors.evaluate(state, player);
        }
        score
    }
}
