use std::collections::HashMap;

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::trace;

use crate::config::{ConfigError, QLearningConfig};
use crate::engine::{Action, GameState, InvalidAction, PlayerId, Position, TransitionResult};
use crate::players::player::{NoLegalActions, Player};

pub type Reward = f64;

const WIN_REWARD: Reward = 1.0;
const LOSS_REWARD: Reward = -1.0;
const NO_REWARD: Reward = 0.0;

/// Key of the Q-table. Equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateActionPair {
    pub state: Position,
    pub action: Action,
}

impl StateActionPair {
    pub fn new(state: &Position, action: Action) -> Self {
        StateActionPair {
            state: state.clone(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error(transparent)]
    NoLegalActions(#[from] NoLegalActions),
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeOutcome {
    pub winner: PlayerId,
    pub num_moves: usize,
}

/// Tabular Q-learning over (position, action) pairs.
///
/// Absent entries read as `0.0` and are only created by [`QLearningPlayer::update`].
/// Every method that needs randomness takes it as an argument, so seeding the
/// generator makes training and play reproducible.
#[derive(Debug, Clone)]
pub struct QLearningPlayer {
    q_table: HashMap<StateActionPair, f64>,
    config: QLearningConfig,
}

impl Default for QLearningPlayer {
    fn default() -> Self {
        QLearningPlayer {
            q_table: HashMap::new(),
            config: QLearningConfig::default(),
        }
    }
}

impl Player for QLearningPlayer {
    fn choose_action<R: Rng + ?Sized>(
        &self,
        position: &Position,
        rng: &mut R,
    ) -> Result<Action, NoLegalActions> {
        self.select_action(position, false, rng)
    }
}

impl QLearningPlayer {
    pub fn new(config: QLearningConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(QLearningPlayer {
            q_table: HashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn q_table(&self) -> &HashMap<StateActionPair, f64> {
        &self.q_table
    }

    pub fn num_entries(&self) -> usize {
        self.q_table.len()
    }

    pub fn value(&self, state: &Position, action: Action) -> f64 {
        self.q_table
            .get(&StateActionPair::new(state, action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Best value reachable from `state`, zero when the board is empty.
    pub fn best_future_reward(&self, state: &Position) -> f64 {
        state
            .actions()
            .map(|action| self.value(state, action))
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
            .unwrap_or(0.0)
    }

    pub fn select_action<R: Rng + ?Sized>(
        &self,
        state: &Position,
        explore: bool,
        rng: &mut R,
    ) -> Result<Action, NoLegalActions> {
        self.select_action_from(state, &state.legal_actions(), explore, rng)
    }

    /// Epsilon-greedy when `explore` is set, greedy otherwise. Ties between
    /// equally valued actions are broken uniformly at random.
    pub fn select_action_from<R: Rng + ?Sized>(
        &self,
        state: &Position,
        legal_actions: &[Action],
        explore: bool,
        rng: &mut R,
    ) -> Result<Action, NoLegalActions> {
        if legal_actions.is_empty() {
            return Err(NoLegalActions(state.clone()));
        }

        if explore && rng.gen_bool(self.config.exploration_rate) {
            if let Some(&action) = legal_actions.choose(rng) {
                return Ok(action);
            }
        }

        let best = legal_actions
            .iter()
            .map(|&action| (action, self.value(state, action)))
            .max_set_by(|a, b| a.1.total_cmp(&b.1));

        best.choose(rng)
            .map(|&(action, _)| action)
            .ok_or_else(|| NoLegalActions(state.clone()))
    }

    pub fn update(&mut self, state: &Position, action: Action, new_value: f64) {
        self.q_table
            .insert(StateActionPair::new(state, action), new_value);
    }

    /// One-step temporal-difference update of `(old_state, action)` toward
    /// `reward + gamma * best_future_reward(following_state)`.
    pub fn update_on_step(
        &mut self,
        old_state: &Position,
        action: Action,
        reward: Reward,
        following_state: &Position,
    ) {
        let old = self.value(old_state, action);
        let target = reward + self.config.discount_factor * self.best_future_reward(following_state);
        let new_value = old + self.config.learning_rate * (target - old);
        trace!(%old_state, %action, reward, old, new_value, "q update");
        self.update(old_state, action, new_value);
    }

    /// Plays one exploratory game against itself from `initial`.
    ///
    /// A move is only credited once the opponent has replied, since that reply
    /// decides which position the mover has to face next. When the board is
    /// emptied the mover loses, and the opponent's last move is rewarded.
    pub fn train_episode<R: Rng + ?Sized>(
        &mut self,
        initial: &Position,
        rng: &mut R,
    ) -> Result<EpisodeOutcome, AgentError> {
        let mut game = GameState::new(initial.clone());
        let mut last: [Option<(Position, Action)>; 2] = [None, None];

        loop {
            let mover = game.to_move();
            let state = game.position().clone();
            let action = self.select_action(&state, true, rng)?;
            last[mover.index()] = Some((state.clone(), action));

            match game.transition(action)? {
                TransitionResult::GameComplete { winner } => {
                    let terminal = game.position();
                    self.update_on_step(&state, action, LOSS_REWARD, terminal);
                    if let Some((winner_state, winner_action)) = &last[winner.index()] {
                        self.update_on_step(winner_state, *winner_action, WIN_REWARD, terminal);
                    }
                    return Ok(EpisodeOutcome {
                        winner,
                        num_moves: game.action_history().len(),
                    });
                }
                TransitionResult::MoveAccepted => {
                    if let Some((other_state, other_action)) = &last[mover.other().index()] {
                        self.update_on_step(other_state, *other_action, NO_REWARD, game.position());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::SplitMix64;

    fn player(learning_rate: f64, exploration_rate: f64) -> QLearningPlayer {
        QLearningPlayer::new(QLearningConfig {
            learning_rate,
            exploration_rate,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_fresh_table_is_zero() {
        let agent = QLearningPlayer::default();
        let position = Position::default();
        for action in position.actions() {
            assert_eq!(0.0, agent.value(&position, action));
        }
        assert_eq!(0.0, agent.best_future_reward(&position));
        assert_eq!(0, agent.num_entries());
    }

    #[test]
    fn test_invalid_config() {
        let result = QLearningPlayer::new(QLearningConfig {
            learning_rate: 2.0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::LearningRate(_))));
    }

    #[test]
    fn test_new_keeps_config() {
        let config = QLearningConfig {
            learning_rate: 0.25,
            exploration_rate: 0.0,
            discount_factor: 0.9,
        };
        let agent = QLearningPlayer::new(config).unwrap();
        assert_eq!(&config, agent.config());
        assert_eq!(&QLearningConfig::default(), QLearningPlayer::default().config());
    }

    #[test]
    fn test_structural_keys() {
        let mut agent = QLearningPlayer::default();
        agent.update(&Position::new(vec![1, 2]), Action::new(1, 2), 0.25);
        // separately built, equal piles
        let same = Position::from(vec![1, 2]);
        assert_eq!(0.25, agent.value(&same, Action::new(1, 2)));
        // order matters
        assert_eq!(0.0, agent.value(&Position::new(vec![2, 1]), Action::new(1, 2)));
    }

    #[test]
    fn test_update_moves_halfway() {
        let mut agent = player(0.5, 0.1);
        let state = Position::new(vec![1]);
        let terminal = Position::new(vec![0]);
        let action = Action::new(0, 1);

        agent.update_on_step(&state, action, 1.0, &terminal);
        assert_eq!(0.5, agent.value(&state, action));
        agent.update_on_step(&state, action, 1.0, &terminal);
        assert_eq!(0.75, agent.value(&state, action));
    }

    #[test]
    fn test_update_uses_best_future() {
        let mut agent = player(0.5, 0.1);
        let following = Position::new(vec![2]);
        agent.update(&following, Action::new(0, 1), 0.8);
        agent.update(&following, Action::new(0, 2), -0.4);
        assert_eq!(0.8, agent.best_future_reward(&following));

        let state = Position::new(vec![3]);
        agent.update_on_step(&state, Action::new(0, 1), 0.0, &following);
        assert_eq!(0.4, agent.value(&state, Action::new(0, 1)));
    }

    #[test]
    fn test_best_future_all_negative() {
        let mut agent = QLearningPlayer::default();
        let state = Position::new(vec![1, 1]);
        agent.update(&state, Action::new(0, 1), -0.5);
        agent.update(&state, Action::new(1, 1), -0.25);
        assert_eq!(-0.25, agent.best_future_reward(&state));
    }

    #[test]
    fn test_terminal_has_no_action() {
        let agent = QLearningPlayer::default();
        let mut rng = SplitMix64::seed_from_u64(1);
        let terminal = Position::new(vec![0, 0]);
        assert_eq!(
            Err(NoLegalActions(terminal.clone())),
            agent.select_action(&terminal, false, &mut rng)
        );
        assert_eq!(
            Err(NoLegalActions(terminal.clone())),
            agent.select_action_from(&terminal, &[], true, &mut rng)
        );
    }

    #[test]
    fn test_greedy_picks_max() {
        let mut agent = player(0.5, 1.0);
        let state = Position::new(vec![3]);
        agent.update(&state, Action::new(0, 2), 0.3);
        agent.update(&state, Action::new(0, 1), -0.3);
        let mut rng = SplitMix64::seed_from_u64(5);
        for _ in 0..50 {
            assert_eq!(
                Ok(Action::new(0, 2)),
                agent.choose_action(&state, &mut rng)
            );
        }
    }

    #[test]
    fn test_greedy_tie_break_is_uniform() {
        let mut agent = QLearningPlayer::default();
        let state = Position::new(vec![1, 3]);
        // (0, 1) is strictly worse, the other three share the max
        agent.update(&state, Action::new(0, 1), -1.0);
        let tied = [Action::new(1, 1), Action::new(1, 2), Action::new(1, 3)];

        let mut rng = SplitMix64::seed_from_u64(42);
        let trials = 6000;
        let mut counts: HashMap<Action, usize> = HashMap::new();
        for _ in 0..trials {
            let action = agent.select_action(&state, false, &mut rng).unwrap();
            *counts.entry(action).or_default() += 1;
        }

        assert_eq!(None, counts.get(&Action::new(0, 1)));
        for action in tied {
            let count = counts.get(&action).copied().unwrap_or(0);
            // expected 2000, sd ~37
            assert!((1800..=2200).contains(&count), "{:?} chosen {} times", action, count);
        }
    }

    #[test]
    fn test_nan_value_never_ties() {
        let mut agent = QLearningPlayer::default();
        let state = Position::new(vec![3]);
        agent.update(&state, Action::new(0, 2), f64::NAN);
        let mut rng = SplitMix64::seed_from_u64(13);
        let first = agent.select_action(&state, false, &mut rng).unwrap();
        for _ in 0..50 {
            assert_eq!(Ok(first), agent.select_action(&state, false, &mut rng));
        }
    }

    #[test]
    fn test_full_exploration_covers_all() {
        let mut agent = player(0.5, 1.0);
        let state = Position::new(vec![2, 1]);
        agent.update(&state, Action::new(0, 1), 10.0);
        let mut rng = SplitMix64::seed_from_u64(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(agent.select_action(&state, true, &mut rng).unwrap());
        }
        assert_eq!(3, seen.len());
    }

    #[test]
    fn test_single_object_episode() {
        let mut agent = QLearningPlayer::default();
        let mut rng = SplitMix64::seed_from_u64(3);
        let position = Position::new(vec![1]);

        let outcome = agent.train_episode(&position, &mut rng).unwrap();
        assert_eq!(
            EpisodeOutcome {
                winner: PlayerId::Second,
                num_moves: 1
            },
            outcome
        );
        // taking the last object loses
        assert_eq!(-0.5, agent.value(&position, Action::new(0, 1)));
        assert_eq!(
            Ok(Action::new(0, 1)),
            agent.choose_action(&position, &mut rng)
        );
    }

    #[test]
    fn test_two_object_pile_learns_misere() {
        let mut agent = QLearningPlayer::default();
        let mut rng = SplitMix64::seed_from_u64(11);
        let position = Position::new(vec![2]);
        for _ in 0..200 {
            agent.train_episode(&position, &mut rng).unwrap();
        }
        // leave the last object to the opponent
        assert!(agent.value(&position, Action::new(0, 1)) > 0.5);
        assert!(agent.value(&position, Action::new(0, 2)) < -0.5);
        assert!(agent.value(&Position::new(vec![1]), Action::new(0, 1)) < -0.5);
        assert_eq!(
            Ok(Action::new(0, 1)),
            agent.choose_action(&position, &mut rng)
        );
    }

    #[test]
    fn test_mid_game_credit() {
        let mut agent = player(0.5, 0.0);
        let mut rng = SplitMix64::seed_from_u64(21);
        let take_one = Action::new(0, 1);
        // force both players to take one object per move: [3] -> [2] -> [1] -> [0]
        agent.update(&Position::new(vec![3]), take_one, 0.1);
        agent.update(&Position::new(vec![2]), take_one, 0.1);

        let outcome = agent.train_episode(&Position::new(vec![3]), &mut rng).unwrap();
        assert_eq!(
            EpisodeOutcome {
                winner: PlayerId::Second,
                num_moves: 3
            },
            outcome
        );

        // first move credited with reward 0 toward [1], whose best value is 0
        let q3 = agent.value(&Position::new(vec![3]), take_one);
        assert!((q3 - 0.05).abs() < 1e-12, "{}", q3);
        // second player's move forced the first into the last object
        let q2 = agent.value(&Position::new(vec![2]), take_one);
        assert!((q2 - 0.55).abs() < 1e-12, "{}", q2);
        assert_eq!(-0.5, agent.value(&Position::new(vec![1]), take_one));
    }

    #[test]
    fn test_zero_exploration_is_deterministic() {
        let position = Position::default();
        let run = || {
            let mut agent = player(0.5, 0.0);
            let mut rng = SplitMix64::seed_from_u64(2024);
            for _ in 0..300 {
                agent.train_episode(&position, &mut rng).unwrap();
            }
            agent
        };
        let first = run();
        let second = run();
        assert!(first.num_entries() > 0);
        assert_eq!(first.q_table(), second.q_table());
    }

    #[test]
    fn test_episode_from_terminal() {
        let mut agent = QLearningPlayer::default();
        let mut rng = SplitMix64::seed_from_u64(0);
        let result = agent.train_episode(&Position::new(vec![0]), &mut rng);
        assert!(matches!(result, Err(AgentError::NoLegalActions(_))));
    }
}
