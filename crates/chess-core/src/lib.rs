//! Core types for chess.
//!
//! This crate provides the fundamental value types shared by the engine:
//! - [`Piece`], [`PieceKind`] and [`Color`] for piece representation
//! - [`Square`], [`File`], and [`Rank`] for board coordinates
//! - [`CastlingRights`] for the four castling flags
//! - FEN parsing and serialization ([`Fen`])

mod castling;
mod color;
mod fen;
mod piece;
mod square;

pub use castling::CastlingRights;
pub use color::Color;
pub use fen::{Fen, FenError, MAX_FULLMOVE_NUMBER};
pub use piece::{Piece, PieceKind};
pub use square::{File, Rank, Square};
