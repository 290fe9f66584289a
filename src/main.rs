//! Train a Nim agent by self-play, then play it on the terminal.
//!
//! Usage: cargo run --release --bin nim -- [--episodes 10000] [--piles 1,3,5,7]

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_xoshiro::SplitMix64;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nim_learner::{
    evaluate, play_interactive, train_agent, PlayerId, Position, QLearningConfig, RandomPlayer,
};

/// Train a misère Nim agent against itself and play it
#[derive(Parser, Debug)]
#[command(name = "nim")]
#[command(about = "Train a Nim AI by self-play, then play against it", long_about = None)]
struct Args {
    /// Number of self-play training games
    #[arg(long, default_value_t = 10000)]
    episodes: usize,

    /// Starting pile sizes, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = vec![1, 3, 5, 7])]
    piles: Vec<u32>,

    /// Learning rate
    #[arg(long, default_value_t = 0.5)]
    alpha: f64,

    /// Exploration rate during training
    #[arg(long, default_value_t = 0.1)]
    epsilon: f64,

    /// Discount applied to the best follow-up value
    #[arg(long, default_value_t = 1.0)]
    gamma: f64,

    /// Random seed (fresh one if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Seat of the human player, 0 moves first (random if omitted)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    human_player: Option<u8>,

    /// Games to play against a random opponent before the interactive game
    #[arg(long, default_value_t = 0)]
    eval_games: usize,

    /// Skip the interactive game
    #[arg(long)]
    no_play: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nim_learner=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(seed, "starting");
    let mut rng = SplitMix64::seed_from_u64(seed);

    let initial = Position::new(args.piles);
    let config = QLearningConfig {
        learning_rate: args.alpha,
        exploration_rate: args.epsilon,
        discount_factor: args.gamma,
    };
    let agent = train_agent(args.episodes, &initial, config, &mut rng)
        .context("training failed")?;

    if args.eval_games > 0 {
        let record = evaluate(&agent, &RandomPlayer, args.eval_games, &initial, &mut rng)
            .context("evaluation failed")?;
        println!(
            "Against a random player: {} wins, {} losses ({:.1}%)",
            record.wins,
            record.losses,
            100.0 * record.win_rate()
        );
    }

    if args.no_play {
        return Ok(());
    }

    let human = match args.human_player {
        Some(seat) => PlayerId::from_index(usize::from(seat)),
        None => PlayerId::from_index(rng.gen_range(0..2)),
    }
    .context("human seat must be 0 or 1")?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    play_interactive(&agent, human, &initial, &mut input, &mut output, &mut rng)?;
    Ok(())
}
