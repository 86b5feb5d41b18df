//! Progress reporting for the search engines
//!
//! The engines never log through global state of their own; they report to
//! an injected [`SearchObserver`]. The default [`TracingObserver`] turns the
//! callbacks into `tracing` events, so output only appears if the embedding
//! application installs a subscriber.

use std::time::Duration;

use tracing::{debug, warn};

use crate::grid::Position;

/// Receives search progress. Every method defaults to doing nothing.
pub trait SearchObserver: Send {
    /// A minimax iteration finished searching to `depth`
    fn on_iteration(
        &mut self,
        _depth: u32,
        _best: Position,
        _value: f64,
        _nodes: usize,
        _elapsed: Duration,
    ) {
    }

    /// The clock ran out while searching to `depth`; that iteration is discarded
    fn on_timeout(&mut self, _depth: u32, _elapsed: Duration) {}

    /// No iteration finished in time and a random legal move was returned
    fn on_random_fallback(&mut self, _choice: Position) {}

    /// MCTS finished a decision
    fn on_mcts_decision(
        &mut self,
        _choice: Position,
        _iterations: u32,
        _visits: u32,
        _win_rate: f64,
    ) {
    }
}

/// Forwards every callback to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_iteration(
        &mut self,
        depth: u32,
        best: Position,
        value: f64,
        nodes: usize,
        elapsed: Duration,
    ) {
        debug!(
            depth,
            %best,
            value,
            nodes,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "search iteration complete"
        );
    }

    fn on_timeout(&mut self, depth: u32, elapsed: Duration) {
        debug!(depth, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "search budget exhausted");
    }

    fn on_random_fallback(&mut self, choice: Position) {
        warn!(%choice, "no search iteration completed, playing a random legal move");
    }

    fn on_mcts_decision(&mut self, choice: Position, iterations: u32, visits: u32, win_rate: f64) {
        debug!(%choice, iterations, visits, win_rate, "mcts decision");
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SearchObserver for NullObserver {}
