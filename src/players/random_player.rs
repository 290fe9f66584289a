use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Action, Position};
use crate::players::player::{NoLegalActions, Player};

/// Picks uniformly among the legal actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlayer;

impl Player for RandomPlayer {
    fn choose_action<R: Rng + ?Sized>(
        &self,
        position: &Position,
        rng: &mut R,
    ) -> Result<Action, NoLegalActions> {
        position
            .legal_actions()
            .choose(rng)
            .copied()
            .ok_or_else(|| NoLegalActions(position.clone()))
    }
}
