use rand::Rng;
use thiserror::Error;

use crate::engine::{Action, Position};

/// Asking for a move on an empty board is a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no legal actions from terminal position {0}")]
pub struct NoLegalActions(pub Position);

pub trait Player {
    fn choose_action<R: Rng + ?Sized>(
        &self,
        position: &Position,
        rng: &mut R,
    ) -> Result<Action, NoLegalActions>;
}
