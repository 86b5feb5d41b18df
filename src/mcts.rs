//! Monte Carlo Tree Search, an alternative to the minimax [`Solver`](crate::solver::Solver)
//!
//! Each iteration runs the four classic phases on a fresh clone of the root state:
//!
//! 1. **Selection**: descend by UCB1 while the node is fully expanded
//! 2. **Expansion**: add one child for a random untried move
//! 3. **Simulation**: play the game out with the configured [`RolloutPolicy`]
//! 4. **Backpropagation**: credit the result to every node on the path
//!
//! Tree edges are plies in the same sense as the minimax solver: a move followed by
//! the greedy removal. A root child whose ply leaves the opponent stuck is a proven
//! win and is chosen outright; otherwise the decision is the root child with the most
//! visits, ties going to the child expanded first. The tree is discarded after every
//! decision.

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use std::time::Instant;

use crate::{
    config::{MctsConfig, RolloutPolicy},
    error::GameError,
    grid::Position,
    heuristics::{Composite, Heuristic},
    observer::{SearchObserver, TracingObserver},
    removal,
    state::{GameState, Outcome, Phase, PlayerId},
};

/// Index of a node in an [`MctsTree`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct MctsNode {
    /// `None` for the root
    pub parent: Option<NodeId>,
    /// Expanded children and the move leading to each
    pub children: Vec<(Position, NodeId)>,
    /// The player who moved into this node; rewards are counted for them
    pub player: PlayerId,
    untried: Vec<Position>,
    pub visits: u32,
    /// 1 per win, 0.5 per draw
    pub wins: f64,
    /// The ply into this node left the opponent stuck
    pub proven_win: bool,
}

impl MctsNode {
    fn new(parent: Option<NodeId>, player: PlayerId, untried: Vec<Position>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            player,
            untried,
            visits: 0,
            wins: 0.0,
            proven_win: false,
        }
    }

    pub fn average_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / self.visits as f64
        }
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    fn ucb1(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        self.average_reward() + exploration * ((parent_visits as f64).ln() / visits).sqrt()
    }
}

/// Arena of search nodes, the root at index 0
#[derive(Debug, Clone)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    fn new(root_state: &GameState) -> Self {
        let mover = root_state.to_move();
        let root = MctsNode::new(None, mover.opponent(), root_state.legal_moves(mover));
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0]
    }

    /// Number of nodes, the root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn add_child(&mut self, parent: NodeId, action: Position, state: &GameState) -> NodeId {
        let mover = state.to_move();
        let mut node = MctsNode::new(Some(parent), mover.opponent(), state.legal_moves(mover));
        node.proven_win = state.outcome() == Some(Outcome::Winner(node.player));
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.get_mut(parent).children.push((action, id));
        id
    }

    fn select_child(&self, id: NodeId, exploration: f64) -> Option<(Position, NodeId)> {
        let node = self.get(id);
        let mut best: Option<((Position, NodeId), f64)> = None;
        for &(action, child) in &node.children {
            let score = self.get(child).ucb1(node.visits, exploration);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some(((action, child), score));
            }
        }
        best.map(|(edge, _)| edge)
    }

    fn backpropagate(&mut self, leaf: NodeId, outcome: Outcome) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.wins += match outcome {
                Outcome::Winner(player) if player == node.player => 1.0,
                Outcome::Winner(_) => 0.0,
                Outcome::Draw => 0.5,
            };
            current = node.parent;
        }
    }

    /// The first expanded root child that wins on the spot, otherwise the most
    /// visited one, the first expanded among equals
    pub fn best_child(&self) -> Option<(Position, NodeId)> {
        let children = &self.get(self.root()).children;
        if let Some(&edge) = children.iter().find(|&&(_, id)| self.get(id).proven_win) {
            return Some(edge);
        }
        let mut best: Option<(Position, NodeId)> = None;
        for &(action, child) in children {
            if best.map_or(true, |(_, id)| self.get(child).visits > self.get(id).visits) {
                best = Some((action, child));
            }
        }
        best
    }
}

/// Monte Carlo Tree Search player engine
pub struct Mcts<H = Composite> {
    config: MctsConfig,
    heuristic: H,
    rng: ChaCha20Rng,
    observer: Box<dyn SearchObserver>,
}

impl Mcts<Composite> {
    pub fn new(config: MctsConfig) -> Result<Self, GameError> {
        let heuristic = Composite::new(config.weights);
        Self::with_heuristic(config, heuristic)
    }
}

impl<H: Heuristic> Mcts<H> {
    /// The heuristic is only consulted by [`RolloutPolicy::Heuristic`]
    ///
    /// Fails with `InvalidConfiguration` if `config` does not validate.
    pub fn with_heuristic(config: MctsConfig, heuristic: H) -> Result<Self, GameError> {
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
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn SearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Grows a fresh tree from `state` for the configured budget
    ///
    /// At least one iteration always runs; the time budget is checked between iterations.
    pub fn search(&mut self, state: &GameState) -> Result<MctsTree, GameError> {
        let player = state.acting_player(Phase::Move)?;
        if state.mobility(player) == 0 {
            return Err(GameError::NoLegalAction { player });
        }

        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);
        let mut tree = MctsTree::new(state);

        for iteration in 0..self.config.iterations.max(1) {
            if iteration > 0 && deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                break;
            }
            let mut working = state.clone();

            // selection
            let mut node = tree.root();
            while tree.get(node).is_fully_expanded() {
                match tree.select_child(node, self.config.exploration) {
                    Some((action, child)) => {
                        removal::play_turn(&mut working, action);
                        node = child;
                    }
                    // terminal node
                    None => break,
                }
            }

            // expansion
            if !tree.get(node).is_fully_expanded() {
                let untried = &mut tree.get_mut(node).untried;
                let idx = self.rng.gen_range(0..untried.len());
                let action = untried.swap_remove(idx);
                removal::play_turn(&mut working, action);
                node = tree.add_child(node, action, &working);
            }

            let outcome = self.rollout(&mut working);
            tree.backpropagate(node, outcome);
        }

        Ok(tree)
    }

    /// Searches and returns the most visited move
    pub fn choose_move(&mut self, state: &GameState) -> Result<Position, GameError> {
        let tree = self.search(state)?;
        let root_visits = tree.get(tree.root()).visits;
        match tree.best_child() {
            Some((action, child)) => {
                let child = tree.get(child);
                self.observer
                    .on_mcts_decision(action, root_visits, child.visits, child.average_reward());
                Ok(action)
            }
            None => {
                let player = state.to_move();
                Err(GameError::NoLegalAction { player })
            }
        }
    }

    /// Same ranking as the minimax solver, ties broken with this engine's generator
    pub fn choose_removal(&mut self, state: &GameState) -> Result<Position, GameError> {
        let player = state.acting_player(Phase::Remove)?;
        removal::best_removals(state)
            .choose(&mut self.rng)
            .copied()
            .ok_or(GameError::NoLegalAction { player })
    }

    /// Plays `state` out to the end and returns the result
    fn rollout(&mut self, state: &mut GameState) -> Outcome {
        loop {
            if let Some(outcome) = state.outcome() {
                return outcome;
            }
            let mover = state.to_move();
            let moves = state.legal_moves(mover);
            match self.config.rollout {
                RolloutPolicy::Random => {
                    let target = moves[self.rng.gen_range(0..moves.len())];
                    state.play_move(target);
                    let removals = state.legal_removals();
                    let at = removals[self.rng.gen_range(0..removals.len())];
                    state.play_removal(at);
                }
                RolloutPolicy::Heuristic => {
                    let mut best = Vec::with_capacity(moves.len());
                    let mut best_score = f64::NEG_INFINITY;
                    for &target in &moves {
                        let undo = removal::play_turn(state, target);
                        let score = self.heuristic.evaluate(state, mover);
                        removal::undo_turn(state, undo);
                        if score > best_score {
                            best_score = score;
                            best.clear();
                        }
                        if score >= best_score {
                            best.push(target);
                        }
                    }
                    // NaN scores never compare, so fall back to any move
                    let candidates = if best.is_empty() { &moves } else { &best };
                    let target = candidates[self.rng.gen_range(0..candidates.len())];
                    removal::play_turn(state, target);
                }
            }
        }
    }
}
