//! Search configuration parameters

use std::time::Duration;

use crate::error::GameError;

/// Weights of the composite heuristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicWeights {
    /// Weight of own legal moves minus the opponent's
    pub mobility: f64,
    /// Weight of the inverse Manhattan distance to the board centre
    pub centrality: f64,
    /// Weight of the number of empty cells around the player
    pub open_neighbors: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            mobility: 1.0,
            centrality: 1.0,
            open_neighbors: 0.5,
        }
    }
}

impl HeuristicWeights {
    /// Pure mobility difference
    pub fn mobility_only() -> Self {
        Self {
            mobility: 1.0,
            centrality: 0.0,
            open_neighbors: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let weights = [self.mobility, self.centrality, self.open_neighbors];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(GameError::InvalidConfiguration {
                message: format!("heuristic weights must be finite, got {:?}", self),
            });
        }
        Ok(())
    }
}

/// Configuration for the minimax solver
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Deepest iteration, in plies of one move plus one removal
    pub max_depth: u32,

    /// Wall-clock budget per decision. `None` searches every depth up to `max_depth`.
    pub time_budget: Option<Duration>,

    pub weights: HeuristicWeights,

    /// Seed for tie-breaking and the random fallback. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Search root moves on the rayon thread pool
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            time_budget: Some(Duration::from_secs(1)),
            weights: HeuristicWeights::default(),
            seed: None,
            parallel: false,
        }
    }
}

impl SearchConfig {
    /// Fixed-depth search without a clock, for reproducible results
    pub fn fixed_depth(depth: u32) -> Self {
        Self {
            max_depth: depth,
            time_budget: None,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    /// Sets the budget in (fractional) seconds; negative or non-finite values clear it
    pub fn with_time_budget_secs(mut self, seconds: f64) -> Self {
        self.time_budget = Duration::try_from_secs_f64(seconds).ok();
        self
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.max_depth == 0 {
            return Err(GameError::InvalidConfiguration {
                message: "search depth must be at least 1".to_string(),
            });
        }
        self.weights.validate()
    }
}

/// How MCTS plays out a game from a new leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutPolicy {
    /// Uniformly random moves and removals
    Random,
    /// Heuristic-best move (random among ties) followed by the greedy removal
    Heuristic,
}

/// Configuration for Monte Carlo Tree Search
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Number of select/expand/simulate/backpropagate iterations per decision
    pub iterations: u32,

    /// Exploration constant C of UCB1
    pub exploration: f64,

    /// Optional wall-clock budget, checked between iterations
    pub time_budget: Option<Duration>,

    pub rollout: RolloutPolicy,

    /// Seed for expansion order and rollouts. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Weights used by the heuristic rollout policy
    pub weights: HeuristicWeights,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            exploration: std::f64::consts::SQRT_2,
            time_budget: None,
            rollout: RolloutPolicy::Random,
            seed: None,
            weights: HeuristicWeights::default(),
        }
    }
}

impl MctsConfig {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_rollout(mut self, rollout: RolloutPolicy) -> Self {
        self.rollout = rollout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.iterations == 0 {
            return Err(GameError::InvalidConfiguration {
                message: "MCTS needs at least one iteration".to_string(),
            });
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(GameError::InvalidConfiguration {
                message: format!(
                    "exploration constant must be finite and >= 0, got {}",
                    self.exploration
                ),
            });
        }
        self.weights.validate()
    }
}
