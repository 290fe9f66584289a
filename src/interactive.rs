use std::io::{self, BufRead, Write};

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::engine::{Action, GameState, InvalidAction, PlayerId, Position, TransitionResult};
use crate::players::{NoLegalActions, QLearningPlayer};

#[derive(Debug, Error)]
pub enum InteractiveError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("input closed before the game finished")]
    InputClosed,
    #[error(transparent)]
    NoLegalActions(#[from] NoLegalActions),
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),
}

fn write_piles<W: Write>(position: &Position, output: &mut W) -> io::Result<()> {
    writeln!(output)?;
    writeln!(output, "Piles:")?;
    for (i, pile) in position.piles().iter().enumerate() {
        writeln!(output, "Pile {}: {}", i, pile)?;
    }
    writeln!(output)
}

fn prompt_number<B: BufRead, W: Write>(
    prompt: &str,
    input: &mut B,
    output: &mut W,
) -> Result<Option<u64>, InteractiveError> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(InteractiveError::InputClosed);
    }
    Ok(line.trim().parse().ok())
}

fn read_human_action<B: BufRead, W: Write>(
    input: &mut B,
    output: &mut W,
) -> Result<Option<Action>, InteractiveError> {
    let pile = prompt_number("Choose Pile: ", input, output)?;
    let count = prompt_number("Choose Count: ", input, output)?;
    let action = match (pile, count) {
        (Some(pile), Some(count)) => usize::try_from(pile)
            .ok()
            .zip(u32::try_from(count).ok())
            .map(|(pile, count)| Action::new(pile, count)),
        _ => None,
    };
    Ok(action)
}

/// Runs one game of a human (reading from `input`) against `agent`, which
/// always plays its best known move. Returns the winner.
pub fn play_interactive<B: BufRead, W: Write, R: Rng + ?Sized>(
    agent: &QLearningPlayer,
    human: PlayerId,
    initial: &Position,
    input: &mut B,
    output: &mut W,
    rng: &mut R,
) -> Result<PlayerId, InteractiveError> {
    let mut game = GameState::new(initial.clone());

    let winner = loop {
        if let Some(winner) = game.winner() {
            break winner;
        }
        write_piles(game.position(), output)?;

        let result = if game.to_move() == human {
            writeln!(output, "Your Turn")?;
            loop {
                let Some(action) = read_human_action(input, output)? else {
                    writeln!(output, "Invalid move, try again.")?;
                    continue;
                };
                match game.transition(action) {
                    Ok(result) => break result,
                    Err(reason) => {
                        debug!(%reason, "rejected human move");
                        writeln!(output, "Invalid move, try again.")?;
                    }
                }
            }
        } else {
            writeln!(output, "AI's Turn")?;
            let action = agent.select_action(game.position(), false, rng)?;
            writeln!(
                output,
                "AI chose to take {} from pile {}.",
                action.count, action.pile
            )?;
            game.transition(action)?
        };

        if let TransitionResult::GameComplete { winner } = result {
            break winner;
        }
    };

    writeln!(output)?;
    writeln!(output, "GAME OVER")?;
    let name = if winner == human { "Human" } else { "AI" };
    writeln!(output, "Winner is {}", name)?;
    Ok(winner)
}
