pub mod player;
pub mod qlearning_player;
pub mod random_player;

pub use player::{NoLegalActions, Player};
pub use qlearning_player::{AgentError, EpisodeOutcome, QLearningPlayer, StateActionPair};
pub use random_player::RandomPlayer;
