//! Chess rules engine on a mailbox board.
//!
//! This crate provides:
//! - [`Position`] - Full game state: pieces, side to move, castling rights, etc.
//! - [`Move`] - Reversible moves carrying everything needed to undo them
//! - Move generation, with legality decided by make/test/unmake
//! - SAN notation parsing and generation ([`move_to_san`], [`san_to_move`])
//! - [`Game`] - A position plus the tree of variations that reached it
//! - PGN scanning and replay ([`pgn`])
//!
//! # Example
//!
//! ```
//! use chess_engine::{Game, Position};
//!
//! let position = Position::startpos();
//! println!("Legal moves from starting position: {}", position.legal_moves().len());
//!
//! let mut game = Game::new();
//! game.add_move_san("e4").unwrap();
//! game.add_move_san("e5").unwrap();
//! assert_eq!(game.san_path(), vec!["e4", "e5"]);
//! println!("Position after 1.e4 e5: {}", game.to_fen());
//! ```

mod game;
mod mov;
pub mod movegen;
pub mod pgn;
mod position;
pub mod san;

pub use game::{Game, GameError, GameNode, NodeId};
pub use mov::Move;
pub use movegen::perft::{perft, perft_divide};
pub use pgn::{parse_pgn, read_games, PgnError, PgnRecord, Token};
pub use position::Position;
pub use san::{move_to_san, san_to_move, SanError};
