use std::fmt;

use itertools::Itertools;
use thiserror::Error;

/// Pile sizes, indexed by pile. Two positions are the same state iff the
/// sequences are equal element-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    piles: Vec<u32>,
}

/// Remove `count` objects from pile `pile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    pub pile: usize,
    pub count: u32,
}

impl Action {
    pub fn new(pile: usize, count: u32) -> Self {
        Action { pile, count }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "take {} from pile {}", self.count, self.pile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum InvalidAction {
    #[error("game is already complete")]
    GameComplete,
    #[error("pile {pile} does not exist (there are {num_piles} piles)")]
    BadPileIndex { pile: usize, num_piles: usize },
    #[error("must remove at least one object")]
    EmptyRemoval,
    #[error("cannot remove {count} from pile {pile}, it holds {available}")]
    NotEnoughObjects {
        pile: usize,
        count: u32,
        available: u32,
    },
}

impl Position {
    pub fn new(piles: Vec<u32>) -> Self {
        Position { piles }
    }

    pub fn piles(&self) -> &[u32] {
        &self.piles
    }

    pub fn total_objects(&self) -> u64 {
        self.piles.iter().map(|&p| u64::from(p)).sum()
    }

    pub fn is_terminal(&self) -> bool {
        self.piles.iter().all(|&p| p == 0)
    }

    /// Iterates legal actions pile by pile, smallest removal first.
    pub fn actions(&self) -> LegalActions<'_> {
        LegalActions::new(self)
    }

    pub fn legal_actions(&self) -> Vec<Action> {
        self.actions().collect()
    }

    fn check(&self, action: Action) -> Result<(), InvalidAction> {
        let available = match self.piles.get(action.pile) {
            Some(&available) => available,
            None => {
                return Err(InvalidAction::BadPileIndex {
                    pile: action.pile,
                    num_piles: self.piles.len(),
                })
            }
        };
        if action.count == 0 {
            return Err(InvalidAction::EmptyRemoval);
        }
        if action.count > available {
            return Err(InvalidAction::NotEnoughObjects {
                pile: action.pile,
                count: action.count,
                available,
            });
        }
        Ok(())
    }

    /// Returns the position after `action`. `self` is left untouched.
    pub fn apply(&self, action: Action) -> Result<Position, InvalidAction> {
        self.check(action)?;
        let mut piles = self.piles.clone();
        piles[action.pile] -= action.count;
        Ok(Position { piles })
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(vec![1, 3, 5, 7])
    }
}

impl From<Vec<u32>> for Position {
    fn from(piles: Vec<u32>) -> Self {
        Position::new(piles)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.piles.iter().join(" "))
    }
}

pub struct LegalActions<'a> {
    position: &'a Position,

    // Internal iteration state
    pile: usize,
    count: u32,
}

impl<'a> LegalActions<'a> {
    fn new(position: &'a Position) -> Self {
        LegalActions {
            position,
            pile: 0,
            count: 0,
        }
    }
}

impl<'a> Iterator for LegalActions<'a> {
    type Item = Action;

    fn next(&mut self) -> Option<Action> {
        let piles = &self.position.piles;
        while self.pile < piles.len() {
            if self.count < piles[self.pile] {
                self.count += 1;
                return Some(Action::new(self.pile, self.count));
            }
            self.pile += 1;
            self.count = 0;
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    First,
    Second,
}

impl PlayerId {
    pub fn other(self) -> PlayerId {
        match self {
            PlayerId::First => PlayerId::Second,
            PlayerId::Second => PlayerId::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerId::First => 0,
            PlayerId::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<PlayerId> {
        match index {
            0 => Some(PlayerId::First),
            1 => Some(PlayerId::Second),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    // Transition did occur, the other player is to move
    MoveAccepted,
    // The board is empty. The player who emptied it lost.
    GameComplete { winner: PlayerId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    position: Position,
    to_move: PlayerId,
    winner: Option<PlayerId>,
    action_history: Vec<(PlayerId, Action)>,
}

impl GameState {
    pub fn new(position: Position) -> Self {
        // Handed an empty board, the first player has already won
        let winner = position.is_terminal().then_some(PlayerId::First);
        GameState {
            position,
            to_move: PlayerId::First,
            winner,
            action_history: vec![],
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn to_move(&self) -> PlayerId {
        self.to_move
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    pub fn action_history(&self) -> &[(PlayerId, Action)] {
        &self.action_history
    }

    /// Plays `action` for the player to move. On error the state is unchanged.
    pub fn transition(&mut self, action: Action) -> Result<TransitionResult, InvalidAction> {
        if self.is_complete() {
            return Err(InvalidAction::GameComplete);
        }
        self.position = self.position.apply(action)?;
        self.action_history.push((self.to_move, action));
        self.to_move = self.to_move.other();

        if self.position.is_terminal() {
            self.winner = Some(self.to_move);
            Ok(TransitionResult::GameComplete {
                winner: self.to_move,
            })
        } else {
            Ok(TransitionResult::MoveAccepted)
        }
    }
}
