//! Standard Algebraic Notation (SAN) parsing and generation.
//!
//! SAN is the standard way to record chess moves in human-readable form.
//! Examples: "e4", "Nf3", "Bxc6", "O-O", "e8=Q", "Nbd2", "R1e1", "Qh5#".
//!
//! Encoding is total and deterministic for every legal move, so decoding is
//! simply "the legal move whose SAN is exactly this text".

use crate::{Move, Position};
use chess_core::PieceKind;
use thiserror::Error;

/// Error type for SAN parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanError {
    /// No legal move in the position renders as this text.
    #[error("invalid move: {0}")]
    InvalidMove(String),
}

/// Converts a move to SAN notation given the current position.
///
/// The position must be the state before the move is made, and the move one
/// of its legal moves.
pub fn move_to_san(position: &Position, m: &Move) -> String {
    let mut san = san_body(position, m);
    if let Some(marker) = outcome_marker(position, m) {
        san.push(marker);
    }
    san
}

/// Finds the legal move whose SAN equals `san` exactly, suffix included.
pub fn san_to_move(position: &Position, san: &str) -> Result<Move, SanError> {
    position
        .legal_moves()
        .into_iter()
        .find(|m| {
            // Only moves whose body prefixes the text pay for the marker.
            let body = san_body(position, m);
            match san.strip_prefix(body.as_str()) {
                Some(rest) => rest.chars().eq(outcome_marker(position, m)),
                None => false,
            }
        })
        .ok_or_else(|| SanError::InvalidMove(san.to_string()))
}

impl Position {
    /// SAN for `m` in this position. See [`move_to_san`].
    pub fn move_to_san(&self, m: &Move) -> String {
        move_to_san(self, m)
    }

    /// The legal move written as `san`. See [`san_to_move`].
    pub fn san_to_move(&self, san: &str) -> Result<Move, SanError> {
        san_to_move(self, san)
    }
}

/// Everything but the check/mate/stalemate marker.
fn san_body(position: &Position, m: &Move) -> String {
    if m.is_castling() {
        return if m.to().file_index() > m.from().file_index() {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let mut san = String::with_capacity(8);
    let kind = m.piece().kind;
    if kind == PieceKind::Pawn {
        if m.is_capture() {
            san.push(m.from().file().to_char());
        }
    } else {
        san.push(kind.san_char());
        san.push_str(&disambiguation(position, m));
    }

    if m.is_capture() {
        san.push('x');
    }
    san.push_str(&m.to().to_algebraic());

    if let Some(promotion) = m.promotion() {
        san.push('=');
        san.push(promotion.kind.san_char());
    }
    san
}

/// Qualifier telling `m` apart from other pieces of the same kind and color
/// that can also reach its target. The source file if that is unique among
/// them, else the source rank if unique, else both.
fn disambiguation(position: &Position, m: &Move) -> String {
    let from = m.from();
    let rivals: Vec<_> = chess_core::Square::all_by_file()
        .filter(|&sq| sq != from && position.piece_at(sq) == Some(m.piece()))
        .filter(|&sq| {
            position
                .pseudo_legal_moves_without_castling(sq)
                .iter()
                .any(|other| other.to() == m.to())
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file = from.file().to_char();
    let rank = from.rank().to_char();
    if rivals.iter().all(|sq| sq.file_index() != from.file_index()) {
        file.to_string()
    } else if rivals.iter().all(|sq| sq.rank_index() != from.rank_index()) {
        rank.to_string()
    } else {
        format!("{}{}", file, rank)
    }
}

/// '+' for check, '#' for checkmate, '=' for stalemate.
fn outcome_marker(position: &Position, m: &Move) -> Option<char> {
    let mut after = position.clone();
    after.apply_move(m);
    let check = after.in_check(after.side_to_move);
    let replies = after.has_legal_moves();
    match (check, replies) {
        (true, true) => Some('+'),
        (true, false) => Some('#'),
        (false, false) => Some('='),
        (false, true) => None,
    }
}
