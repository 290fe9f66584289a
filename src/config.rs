use thiserror::Error;

/// Hyperparameters of the Q-learning player, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearningConfig {
    /// Weight given to new evidence over the retained estimate, in (0, 1].
    pub learning_rate: f64,
    /// Probability of a uniformly random move while exploring, in [0, 1].
    pub exploration_rate: f64,
    /// Weight of the best follow-up value in the update target, in [0, 1].
    pub discount_factor: f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        QLearningConfig {
            learning_rate: 0.5,
            exploration_rate: 0.1,
            discount_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("learning rate must be in (0, 1], got {0}")]
    LearningRate(f64),
    #[error("exploration rate must be in [0, 1], got {0}")]
    ExplorationRate(f64),
    #[error("discount factor must be in [0, 1], got {0}")]
    DiscountFactor(f64),
}

impl QLearningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Written so that NaN fails every check
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(ConfigError::ExplorationRate(self.exploration_rate));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(ConfigError::DiscountFactor(self.discount_factor));
        }
        Ok(())
    }
}
