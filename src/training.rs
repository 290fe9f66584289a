use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, QLearningConfig};
use crate::engine::{GameState, PlayerId, Position, TransitionResult};
use crate::players::{AgentError, Player, QLearningPlayer};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("at least one training game is required")]
    NoEpisodes,
    #[error("cannot train from terminal position {0}")]
    TerminalStart(Position),
    #[error("training game {episode} failed")]
    Episode {
        episode: usize,
        #[source]
        source: AgentError,
    },
}

/// Trains a fresh agent by playing `num_episodes` games against itself.
pub fn train_agent<R: Rng + ?Sized>(
    num_episodes: usize,
    initial: &Position,
    config: QLearningConfig,
    rng: &mut R,
) -> Result<QLearningPlayer, TrainingError> {
    let mut agent = QLearningPlayer::new(config)?;
    if num_episodes == 0 {
        return Err(TrainingError::NoEpisodes);
    }
    if initial.is_terminal() {
        return Err(TrainingError::TerminalStart(initial.clone()));
    }

    info!(num_episodes, %initial, "training");
    for episode in 1..=num_episodes {
        debug!("Playing training game {}", episode);
        let outcome = agent
            .train_episode(initial, rng)
            .map_err(|source| TrainingError::Episode { episode, source })?;
        debug!(winner = ?outcome.winner, moves = outcome.num_moves, "game finished");
    }
    info!(entries = agent.num_entries(), "done training");

    Ok(agent)
}

/// Plays a full game from `initial`, `first` moving first. Returns the winner.
pub fn play_match<A: Player, B: Player, R: Rng + ?Sized>(
    first: &A,
    second: &B,
    initial: &Position,
    rng: &mut R,
) -> Result<PlayerId, AgentError> {
    let mut game = GameState::new(initial.clone());
    loop {
        if let Some(winner) = game.winner() {
            return Ok(winner);
        }
        let action = match game.to_move() {
            PlayerId::First => first.choose_action(game.position(), rng)?,
            PlayerId::Second => second.choose_action(game.position(), rng)?,
        };
        if let TransitionResult::GameComplete { winner } = game.transition(action)? {
            return Ok(winner);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchRecord {
    pub wins: usize,
    pub losses: usize,
}

impl MatchRecord {
    pub fn games(&self) -> usize {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        if self.games() == 0 {
            return 0.0;
        }
        self.wins as f64 / self.games() as f64
    }
}

/// Plays `games` games of `agent` against `opponent`, alternating who starts.
pub fn evaluate<A: Player, B: Player, R: Rng + ?Sized>(
    agent: &A,
    opponent: &B,
    games: usize,
    initial: &Position,
    rng: &mut R,
) -> Result<MatchRecord, AgentError> {
    let mut record = MatchRecord::default();
    for game in 0..games {
        let agent_seat = if game % 2 == 0 {
            PlayerId::First
        } else {
            PlayerId::Second
        };
        let winner = match agent_seat {
            PlayerId::First => play_match(agent, opponent, initial, rng)?,
            PlayerId::Second => play_match(opponent, agent, initial, rng)?,
        };
        if winner == agent_seat {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
    }
    debug!(?record, "evaluation finished");
    Ok(record)
}
