//! Turn driver for one game between two players

use rand::Rng;
use tracing::{debug, info};

use crate::{
    error::GameError,
    player::Player,
    state::{GameState, Outcome, PlayerId},
};

/// A game session: the authoritative state plus the two players
///
/// Actions reach the state strictly in the order Move(p), Remove(p),
/// Move(opponent), Remove(opponent), ...; players only ever see a shared
/// reference to the state.
pub struct Game {
    state: GameState,
    players: [Player; 2],
    turns: usize,
}

impl Game {
    /// Starts from `state`, `player_a` controlling token A
    pub fn new(state: GameState, player_a: Player, player_b: Player) -> Self {
        Self {
            state,
            players: [player_a, player_b],
            turns: 0,
        }
    }

    /// The default board with the first player drawn from `rng`
    pub fn with_random_start<R: Rng + ?Sized>(
        rng: &mut R,
        player_a: Player,
        player_b: Player,
    ) -> Self {
        let first = if rng.gen_bool(0.5) { PlayerId::A } else { PlayerId::B };
        Self::new(GameState::standard_with_first_player(first), player_a, player_b)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    /// Completed turns (move plus removal)
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Plays one full turn for the player to act
    ///
    /// Returns the outcome instead if the player to act is already stuck.
    pub fn play_turn(&mut self) -> Result<Option<Outcome>, GameError> {
        if let Some(outcome) = self.state.outcome() {
            return Ok(Some(outcome));
        }
        let id = self.state.to_move();
        let player = &mut self.players[id.index()];

        let target = player.choose_move(&self.state)?;
        self.state.apply_move(id, target.row, target.col)?;

        let at = player.choose_token_to_remove(&self.state)?;
        self.state.apply_removal(at.row, at.col)?;

        self.turns += 1;
        debug!(player = %id, name = player.name(), to = %target, removed = %at, "turn played");
        Ok(None)
    }

    /// Plays until someone is stuck
    pub fn play(&mut self) -> Result<Outcome, GameError> {
        loop {
            if let Some(outcome) = self.play_turn()? {
                info!(?outcome, turns = self.turns, "game over");
                return Ok(outcome);
            }
        }
    }
}
