//! Minimax search with alpha-beta pruning and iterative deepening

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use std::time::Instant;

use crate::{
    config::SearchConfig,
    error::GameError,
    grid::Position,
    heuristics::{Composite, Heuristic},
    observer::{SearchObserver, TracingObserver},
    removal,
    state::{GameState, Phase, PlayerId},
};

/// Magnitude of a won position's score, before the depth bonus
///
/// Any score at or beyond this magnitude is a forced result, never a heuristic value.
pub const WIN_SCORE: f64 = 1_000_000.0;

// heuristic leaves stay strictly inside the forced-result scores
const HEURISTIC_BOUND: f64 = WIN_SCORE - 1.0;

// nodes searched between clock reads
const CLOCK_CHECK_INTERVAL: usize = 1024;

/// A token can have at most 8 moves
struct MoveSorter {
    size: usize,
    // target cell and ordering score
    moves: [(Position, f64); 8],
}

impl MoveSorter {
    pub fn new() -> Self {
        Self {
            size: 0,
            moves: [(Position::new(0, 0), 0.0); 8],
        }
    }
    pub fn push(&mut self, target: Position, score: f64) {
        let mut pos = self.size;
        self.size += 1;
        while pos != 0 && self.moves[pos - 1].1 > score {
            self.moves[pos] = self.moves[pos - 1];
            pos -= 1;
        }
        self.moves[pos] = (target, score);
    }
}
impl Iterator for MoveSorter {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        match self.size {
            0 => None,
            _ => {
                self.size -= 1;
                Some(self.moves[self.size].0)
            }
        }
    }
}

/// One search over a detached working copy of the state
///
/// Children are explored with make/undo on `state`; the caller's state is never touched.
struct Search<'h, H> {
    state: GameState,
    root: PlayerId,
    heuristic: &'h H,
    deadline: Option<Instant>,
    nodes: usize,
    aborted: bool,
}

impl<'h, H: Heuristic> Search<'h, H> {
    fn new(state: GameState, heuristic: &'h H, deadline: Option<Instant>) -> Self {
        Self {
            root: state.to_move(),
            state,
            heuristic,
            deadline,
            nodes: 0,
            aborted: false,
        }
    }

    fn out_of_time(&mut self) -> bool {
        if !self.aborted && self.nodes % CLOCK_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                self.aborted = Instant::now() >= deadline;
            }
        }
        self.aborted
    }

    /// Score of a position whose player to move is stuck, from the root player's view
    fn terminal_value(&self, depth: u32) -> Option<f64> {
        let to_move = self.state.to_move();
        if self.state.mobility(to_move) != 0 {
            return None;
        }
        if self.state.mobility(to_move.opponent()) == 0 {
            return Some(0.0);
        }
        // remaining depth rewards quicker wins and slower losses
        let value = WIN_SCORE + depth as f64;
        Some(if to_move == self.root { -value } else { value })
    }

    /// Heuristic score of a non-terminal leaf, clamped below any forced result
    fn leaf_value(&self) -> f64 {
        let value = self.heuristic.evaluate(&self.state, self.root);
        if value.is_nan() {
            0.0
        } else {
            value.clamp(-HEURISTIC_BOUND, HEURISTIC_BOUND)
        }
    }

    /// Moves most likely to be good first: `first`, then targets with the most room
    fn ordered_moves(&self, first: Option<Position>) -> MoveSorter {
        let grid = self.state.grid();
        let mut moves = MoveSorter::new();
        for target in self.state.legal_moves(self.state.to_move()) {
            let score = if Some(target) == first {
                f64::INFINITY
            } else {
                grid.neighbours(target).filter(|&p| grid.at(p).is_empty()).count() as f64
            };
            moves.push(target, score);
        }
        moves
    }

    fn alpha_beta(&mut self, depth: u32, mut alpha: f64, mut beta: f64, maximizing: bool) -> f64 {
        self.nodes += 1;
        if self.out_of_time() {
            return 0.0;
        }
        if let Some(value) = self.terminal_value(depth) {
            return value;
        }
        if depth == 0 {
            return self.leaf_value();
        }

        if maximizing {
            let mut value = f64::NEG_INFINITY;
            for target in self.ordered_moves(None) {
                let undo = removal::play_turn(&mut self.state, target);
                let score = self.alpha_beta(depth - 1, alpha, beta, false);
                removal::undo_turn(&mut self.state, undo);
                if self.aborted {
                    return 0.0;
                }
                value = value.max(score);
                alpha = alpha.max(value);
                if beta <= alpha {
                    break;
                }
            }
            value
        } else {
            let mut value = f64::INFINITY;
            for target in self.ordered_moves(None) {
                let undo = removal::play_turn(&mut self.state, target);
                let score = self.alpha_beta(depth - 1, alpha, beta, true);
                removal::undo_turn(&mut self.state, undo);
                if self.aborted {
                    return 0.0;
                }
                value = value.min(score);
                beta = beta.min(value);
                if beta <= alpha {
                    break;
                }
            }
            value
        }
    }

    /// Unpruned minimax, for checking the alpha-beta search
    fn minimax(&mut self, depth: u32, maximizing: bool) -> f64 {
        self.nodes += 1;
        if let Some(value) = self.terminal_value(depth) {
            return value;
        }
        if depth == 0 {
            return self.leaf_value();
        }

        let mut value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        for target in self.state.legal_moves(self.state.to_move()) {
            let undo = removal::play_turn(&mut self.state, target);
            let score = self.minimax(depth - 1, !maximizing);
            removal::undo_turn(&mut self.state, undo);
            value = if maximizing {
                value.max(score)
            } else {
                value.min(score)
            };
        }
        value
    }

    /// Searches every root move to `depth`, returning the first best move and its score
    ///
    /// Returns `None` if the clock ran out before the iteration finished.
    fn top_level_search(&mut self, depth: u32, first: Option<Position>) -> Option<(Position, f64)> {
        let mut alpha = f64::NEG_INFINITY;
        let mut best: Option<(Position, f64)> = None;
        for target in self.ordered_moves(first) {
            let undo = removal::play_turn(&mut self.state, target);
            let score = self.alpha_beta(depth - 1, alpha, f64::INFINITY, false);
            removal::undo_turn(&mut self.state, undo);
            if self.aborted {
                return None;
            }
            // later moves only prove an upper bound when they fail low, so ties keep the first
            if best.map_or(true, |(_, value)| score > value) {
                best = Some((target, score));
            }
            alpha = alpha.max(score);
        }
        best
    }
}

/// Same as [`Search::top_level_search`] with one rayon task per root move
///
/// Each task owns a clone of the state; results are joined once all tasks finish.
fn parallel_top_level_search<H: Heuristic>(
    state: &GameState,
    heuristic: &H,
    depth: u32,
    first: Option<Position>,
    deadline: Option<Instant>,
) -> (Option<(Position, f64)>, usize) {
    let order: Vec<Position> = Search::new(state.clone(), heuristic, deadline)
        .ordered_moves(first)
        .collect();

    let results: Vec<(Position, Option<f64>, usize)> = order
        .par_iter()
        .map(|&target| {
            let mut worker = Search::new(state.clone(), heuristic, deadline);
            removal::play_turn(&mut worker.state, target);
            let score = worker.alpha_beta(depth - 1, f64::NEG_INFINITY, f64::INFINITY, false);
            let score = if worker.aborted { None } else { Some(score) };
            (target, score, worker.nodes + 1)
        })
        .collect();

    let nodes = results.iter().map(|(_, _, nodes)| nodes).sum();
    let mut best: Option<(Position, f64)> = None;
    for (target, score, _) in results {
        let score = match score {
            Some(score) => score,
            None => return (None, nodes),
        };
        if best.map_or(true, |(_, value)| score > value) {
            best = Some((target, score));
        }
    }
    (best, nodes)
}

/// Chooses moves and removals for the player to act
///
/// # Notes
/// One ply of the search is a full half-turn: the acting player's move followed by
/// their removal. The removal is not branched on; the search assumes the greedy
/// removal from [`removal::greedy_removal`]. Positions are scored from the point of
/// view of the player to act at the root, who maximizes while the opponent minimizes.
///
/// # Position Scoring
/// A position where the player to move is stuck scores `±(WIN_SCORE + remaining depth)`,
/// so shorter wins score higher than longer ones, or `0` when neither player can move.
/// Anything else at the depth limit gets the heuristic value, clamped to stay strictly
/// between `-WIN_SCORE` and `WIN_SCORE` whatever the weights.
pub struct Solver<H = Composite> {
    config: SearchConfig,
    heuristic: H,
    rng: ChaCha20Rng,
    observer: Box<dyn SearchObserver>,

    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
    /// Deepest iteration completed by the last call to `choose_move`
    pub completed_depth: u32,
}

impl Solver<Composite> {
    /// Creates a `Solver` scoring leaves with the composite heuristic from `config.weights`
    pub fn new(config: SearchConfig) -> Result<Self, GameError> {
        let heuristic = Composite::new(config.weights);
        Self::with_heuristic(config, heuristic)
    }
}

impl<H: Heuristic> Solver<H> {
    /// Fails with `InvalidConfiguration` if `config` does not validate
    pub fn with_heuristic(config: SearchConfig, heuristic: H) -> Result<Self, GameError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Ok(Self {
            config,
            heuristic,
            rng,
            observer: Box::new(TracingObserver),
            node_count: 0,
            completed_depth: 0,
        })
    }

    /// Replaces the default `tracing` observer
    pub fn with_observer(mut self, observer: Box<dyn SearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Picks a move for the player to act with iterative deepening
    ///
    /// The move from the deepest completed iteration wins. If the budget runs out
    /// before depth 1 completes, a uniformly random legal move is returned.
    pub fn choose_move(&mut self, state: &GameState) -> Result<Position, GameError> {
        let player = state.acting_player(Phase::Move)?;
        let moves = state.legal_moves(player);
        if moves.is_empty() {
            return Err(GameError::NoLegalAction { player });
        }

        self.completed_depth = 0;
        let start = Instant::now();
        let deadline = self.config.time_budget.map(|budget| start + budget);

        // every ply removes a cell, so the game cannot outlast the empty cells
        let horizon = state.legal_removals().len().max(1) as u32;
        let max_depth = self.config.max_depth.clamp(1, horizon);

        let mut best: Option<(Position, f64)> = None;
        for depth in 1..=max_depth {
            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                self.observer.on_timeout(depth, start.elapsed());
                break;
            }

            let first = best.map(|(target, _)| target);
            let (result, nodes) = if self.config.parallel {
                parallel_top_level_search(state, &self.heuristic, depth, first, deadline)
            } else {
                let mut search = Search::new(state.clone(), &self.heuristic, deadline);
                let result = search.top_level_search(depth, first);
                (result, search.nodes)
            };
            self.node_count += nodes;

            match result {
                Some((target, value)) => {
                    best = Some((target, value));
                    self.completed_depth = depth;
                    self.observer
                        .on_iteration(depth, target, value, nodes, start.elapsed());
                    // a forced win found at the shallowest depth is the quickest one
                    if value >= WIN_SCORE {
                        break;
                    }
                }
                None => {
                    self.observer.on_timeout(depth, start.elapsed());
                    break;
                }
            }
        }

        match best {
            Some((target, _)) => Ok(target),
            None => {
                let choice = *moves
                    .choose(&mut self.rng)
                    .ok_or(GameError::NoLegalAction { player })?;
                self.observer.on_random_fallback(choice);
                Ok(choice)
            }
        }
    }

    /// Picks the removal that costs the opponent the most mobility
    ///
    /// Ties are broken uniformly with the solver's seeded generator.
    pub fn choose_removal(&mut self, state: &GameState) -> Result<Position, GameError> {
        let player = state.acting_player(Phase::Remove)?;
        removal::best_removals(state)
            .choose(&mut self.rng)
            .copied()
            .ok_or(GameError::NoLegalAction { player })
    }

    /// Alpha-beta value of a Move-phase position for the player to act, `depth` plies deep
    pub fn alpha_beta_value(&mut self, state: &GameState, depth: u32) -> Result<f64, GameError> {
        state.acting_player(Phase::Move)?;
        let mut search = Search::new(state.clone(), &self.heuristic, None);
        let value = search.alpha_beta(depth, f64::NEG_INFINITY, f64::INFINITY, true);
        self.node_count += search.nodes;
        Ok(value)
    }

    /// Plain minimax value of a Move-phase position, without pruning
    pub fn minimax_value(&mut self, state: &GameState, depth: u32) -> Result<f64, GameError> {
        state.acting_player(Phase::Move)?;
        let mut search = Search::new(state.clone(), &self.heuristic, None);
        let value = search.minimax(depth, true);
        self.node_count += search.nodes;
        Ok(value)
    }
}
