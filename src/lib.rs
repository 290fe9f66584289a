//! Self-play Q-learning for misère Nim: the player who takes the last object loses.

pub mod config;
pub mod engine;
pub mod interactive;
pub mod players;
pub mod training;

pub use config::{ConfigError, QLearningConfig};
pub use engine::{Action, GameState, InvalidAction, PlayerId, Position, TransitionResult};
pub use interactive::{play_interactive, InteractiveError};
pub use players::{NoLegalActions, Player, QLearningPlayer, RandomPlayer};
pub use training::{evaluate, play_match, train_agent, MatchRecord, TrainingError};
