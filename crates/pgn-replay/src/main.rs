//! pgn-replay - replays PGN records and inspects positions.
//!
//! Games that fail to replay are reported and skipped; the rest of the file
//! is still processed.

use anyhow::Context;
use chess_engine::{move_to_san, perft, perft_divide, read_games, Position};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pgn-replay")]
#[command(about = "Replay PGN games and inspect chess positions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay every game in a PGN file
    Replay {
        /// PGN file to read
        file: PathBuf,
        /// Print the final board of each game
        #[arg(long)]
        board: bool,
        /// Print the final FEN of each game
        #[arg(long)]
        fen: bool,
    },
    /// List the legal moves of a position in SAN
    Moves {
        /// Position to inspect (defaults to the starting position)
        #[arg(long)]
        fen: Option<String>,
    },
    /// Count leaf nodes of the legal move tree
    Perft {
        /// Depth in plies
        depth: u32,
        /// Position to search (defaults to the starting position)
        #[arg(long)]
        fen: Option<String>,
        /// Show the node count below each root move
        #[arg(long)]
        divide: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { file, board, fen } => replay(&file, board, fen),
        Commands::Moves { fen } => {
            let position = load_position(fen.as_deref())?;
            let moves: Vec<String> = position
                .legal_moves()
                .iter()
                .map(|m| move_to_san(&position, m))
                .collect();
            println!("{}", moves.join(" "));
            Ok(())
        }
        Commands::Perft { depth, fen, divide } => {
            let position = load_position(fen.as_deref())?;
            let start = Instant::now();
            let nodes: u64 = if divide {
                let results = perft_divide(&position, depth);
                for (uci, count) in &results {
                    println!("{}: {}", uci, count);
                }
                results.iter().map(|(_, n)| n).sum()
            } else {
                perft(&position, depth)
            };
            tracing::info!("perft({}) finished in {:?}", depth, start.elapsed());
            println!("Nodes: {}", nodes);
            Ok(())
        }
    }
}

fn load_position(fen: Option<&str>) -> anyhow::Result<Position> {
    match fen {
        Some(fen) => Position::from_fen(fen).with_context(|| format!("invalid FEN {:?}", fen)),
        None => Ok(Position::startpos()),
    }
}

fn replay(file: &Path, board: bool, fen: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let games = read_games(&text).with_context(|| format!("failed to scan {}", file.display()))?;

    let mut replayed = 0;
    for (i, game) in games.iter().enumerate() {
        let number = i + 1;
        let game = match game {
            Ok(game) => game,
            Err(e) => {
                tracing::warn!("Skipping game {}: {}", number, e);
                continue;
            }
        };
        replayed += 1;

        println!("Game {}: {}", number, game.san_path().join(" "));
        if board {
            print!("{}", game.position());
        }
        if fen {
            println!("{}", game.to_fen());
        }
    }

    tracing::info!("Replayed {} of {} games", replayed, games.len());
    Ok(())
}
