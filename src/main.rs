use std::{collections::HashMap, time::Duration};

use anyhow::Context;
use clap::Parser;
use draughts::{
    engine::{
        scythe::{EngineConfig, Scythe},
        search::SearchLimits,
        Engine,
    },
    eval::EvalConfig,
    Board, Result, START_BOARD_FEN,
};
use log::info;

/// Lets the engine play a game against itself.
#[derive(Parser, Debug)]
struct Cli {
    /// start position
    #[arg(long, default_value = START_BOARD_FEN)]
    fen: String,

    /// thinking time per move in milliseconds
    #[arg(short, long, default_value = "500")]
    think_ms: u64,

    /// stop every search after this depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// end the game as a draw after this many moves
    #[arg(long, default_value = "200")]
    max_moves: u32,

    /// score positions by material only
    #[arg(long)]
    material_only: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let board = Board::from_fen(&args.fen).context("invalid --fen")?;
    let config = EngineConfig {
        eval: if args.material_only {
            EvalConfig::material_only()
        } else {
            EvalConfig::default()
        },
        limits: SearchLimits {
            max_depth: args.max_depth,
        },
    };
    let budget = Duration::from_millis(args.think_ms);

    let mut engine = Scythe::with_config(board, config);
    let mut seen_positions: HashMap<u64, u8> = HashMap::new();
    println!("{}\n", engine.board());

    for move_number in 1..=args.max_moves {
        if let Some(winner) = engine.board().winner() {
            println!("{winner} wins");
            return Ok(());
        }

        let repetitions = seen_positions
            .entry(engine.board().zobrist_hash)
            .or_default();
        *repetitions += 1;
        if *repetitions >= 3 {
            println!("draw by repetition");
            return Ok(());
        }

        let side = engine.board().next_move;
        let (mve, score) = engine.think(budget)?;
        info!(
            "{move_number}. {side} plays {mve} (score {score}, depth {})",
            engine.stats().completed_depth
        );
        engine.accept_move(mve);
        println!("{move_number}. {side}: {mve} ({score})\n{}\n", engine.board());
    }

    println!("draw after {} moves", args.max_moves);
    Ok(())
}
