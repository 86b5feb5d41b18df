//! Players: anything that can pick a move and a removal for the side to act

use anyhow::{anyhow, Result};

use std::{fmt, str::FromStr};

use crate::{
    config::{MctsConfig, SearchConfig},
    error::GameError,
    grid::Position,
    mcts::Mcts,
    solver::Solver,
    state::{GameState, Phase, PlayerId},
};

/// Where a human player's coordinates come from (a terminal, a GUI, a test script)
///
/// Returning `None` means the source has nothing more to give.
pub trait InputSource: Send {
    fn request_move(&mut self, state: &GameState, player: PlayerId) -> Option<Position>;

    fn request_removal(&mut self, state: &GameState, player: PlayerId) -> Option<Position>;

    /// Feedback for an attempt that was not legal; the request is repeated afterwards
    fn rejected(&mut self, _attempt: Position, _error: &GameError) {}
}

/// A player driven by an [`InputSource`]
///
/// Input is checked against the rules here and re-requested until legal.
pub struct HumanPlayer {
    name: String,
    input: Box<dyn InputSource>,
}

impl HumanPlayer {
    pub fn new(name: impl Into<String>, input: Box<dyn InputSource>) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Position, GameError> {
        let player = state.acting_player(Phase::Move)?;
        if state.mobility(player) == 0 {
            return Err(GameError::NoLegalAction { player });
        }
        loop {
            let attempt = self
                .input
                .request_move(state, player)
                .ok_or(GameError::InputClosed { player })?;
            if state.is_legal_move(player, attempt.row, attempt.col) {
                return Ok(attempt);
            }
            let error = GameError::IllegalMove {
                player,
                target: attempt,
            };
            self.input.rejected(attempt, &error);
        }
    }

    fn choose_token_to_remove(&mut self, state: &GameState) -> Result<Position, GameError> {
        let player = state.acting_player(Phase::Remove)?;
        loop {
            let attempt = self
                .input
                .request_removal(state, player)
                .ok_or(GameError::InputClosed { player })?;
            if state.is_legal_removal(attempt.row, attempt.col) {
                return Ok(attempt);
            }
            self.input
                .rejected(attempt, &GameError::IllegalRemoval { target: attempt });
        }
    }
}

/// The search engine behind a computer player
pub enum Engine {
    Minimax(Solver),
    Mcts(Mcts),
}

/// Engine settings for building a computer player
#[derive(Debug, Clone)]
pub enum EngineConfig {
    Minimax(SearchConfig),
    Mcts(MctsConfig),
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::Minimax(SearchConfig::default())
    }
}

impl EngineConfig {
    fn build(self) -> Result<Engine, GameError> {
        match self {
            EngineConfig::Minimax(config) => Ok(Engine::Minimax(Solver::new(config)?)),
            EngineConfig::Mcts(config) => Ok(Engine::Mcts(Mcts::new(config)?)),
        }
    }
}

/// A player driven by a search engine; it only ever returns legal actions
pub struct ComputerPlayer {
    name: String,
    engine: Engine,
}

impl ComputerPlayer {
    pub fn new(name: impl Into<String>, config: EngineConfig) -> Result<Self, GameError> {
        Ok(Self {
            name: name.into(),
            engine: config.build()?,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Position, GameError> {
        match &mut self.engine {
            Engine::Minimax(solver) => solver.choose_move(state),
            Engine::Mcts(mcts) => mcts.choose_move(state),
        }
    }

    fn choose_token_to_remove(&mut self, state: &GameState) -> Result<Position, GameError> {
        match &mut self.engine {
            Engine::Minimax(solver) => solver.choose_removal(state),
            Engine::Mcts(mcts) => mcts.choose_removal(state),
        }
    }
}

/// Type tag for [`Player::from_kind`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PlayerKind {
    Human,
    Computer,
}

impl FromStr for PlayerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(PlayerKind::Human),
            "computer" => Ok(PlayerKind::Computer),
            _ => Err(anyhow!("unknown player type '{}', expected 'human' or 'computer'", s)),
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerKind::Human => write!(f, "Human"),
            PlayerKind::Computer => write!(f, "Computer"),
        }
    }
}

pub enum Player {
    Human(HumanPlayer),
    Computer(ComputerPlayer),
}

impl Player {
    pub fn human(name: impl Into<String>, input: Box<dyn InputSource>) -> Self {
        Player::Human(HumanPlayer::new(name, input))
    }

    pub fn computer(name: impl Into<String>, config: EngineConfig) -> Result<Self, GameError> {
        Ok(Player::Computer(ComputerPlayer::new(name, config)?))
    }

    /// Builds a player from its type tag
    ///
    /// Human players need an input source; computer players use `engine`.
    pub fn from_kind(
        kind: PlayerKind,
        name: impl Into<String>,
        engine: EngineConfig,
        input: Option<Box<dyn InputSource>>,
    ) -> Result<Self, GameError> {
        match kind {
            PlayerKind::Human => match input {
                Some(input) => Ok(Player::human(name, input)),
                None => Err(GameError::InvalidConfiguration {
                    message: "a human player needs an input source".to_string(),
                }),
            },
            PlayerKind::Computer => Player::computer(name, engine),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Player::Human(human) => &human.name,
            Player::Computer(computer) => &computer.name,
        }
    }

    pub fn kind(&self) -> PlayerKind {
        match self {
            Player::Human(_) => PlayerKind::Human,
            Player::Computer(_) => PlayerKind::Computer,
        }
    }

    /// Picks where the player to act moves; `NoLegalAction` means they have lost
    pub fn choose_move(&mut self, state: &GameState) -> Result<Position, GameError> {
        match self {
            Player::Human(human) => human.choose_move(state),
            Player::Computer(computer) => computer.choose_move(state),
        }
    }

    /// Picks which cell the player to act removes
    pub fn choose_token_to_remove(&mut self, state: &GameState) -> Result<Position, GameError> {
        match self {
            Player::Human(human) => human.choose_token_to_remove(state),
            Player::Computer(computer) => computer.choose_token_to_remove(state),
        }
    }
}
