//! FEN (Forsyth-Edwards Notation) parsing and serialization.

use crate::{CastlingRights, Color, Piece, PieceKind, Square};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: empty input")]
    Empty,

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid piece placement: expected one {0} king, found {1}")]
    InvalidKingCount(Color, usize),

    #[error("invalid FEN: missing side to move")]
    MissingActiveColor,

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),

    #[error("invalid FEN: unexpected trailing input '{0}'")]
    TrailingInput(String),
}

/// A parsed FEN record.
///
/// Only the placement and side to move are mandatory. Missing trailing
/// fields take their start-of-game defaults: all castling rights, no
/// en passant target, a zero halfmove clock, and move number one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    /// Square contents indexed by [`Square::index`].
    pub board: [Option<Piece>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    /// Halfmoves since the last capture or pawn move.
    pub halfmove_clock: u32,
    /// Fullmove number, at least 1.
    pub fullmove_number: u32,
}

/// Largest accepted fullmove number; keeps [`Fen::ply`] within `u32`.
pub const MAX_FULLMOVE_NUMBER: u32 = u32::MAX / 2;

impl Fen {
    /// The standard starting position.
    ///
    /// Its move number 0 is read as 1, so serializing the parsed record
    /// yields "... - 0 1".
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0";

    /// Parses a FEN string.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let mut parts = fen.split_whitespace();

        let placement = parts.next().ok_or(FenError::Empty)?;
        let board = parse_placement(placement)?;

        let side_to_move = match parts.next() {
            Some(token) => Color::from_fen_token(token)
                .ok_or_else(|| FenError::InvalidActiveColor(token.to_string()))?,
            None => return Err(FenError::MissingActiveColor),
        };

        let castling = match parts.next() {
            Some(token) => CastlingRights::from_fen_field(token)
                .ok_or_else(|| FenError::InvalidCastlingRights(token.to_string()))?,
            None => CastlingRights::ALL,
        };

        let en_passant = match parts.next() {
            Some(token) => parse_en_passant(token)?,
            None => None,
        };

        let halfmove_clock = match parts.next() {
            Some(token) => token
                .parse::<u32>()
                .map_err(|_| FenError::InvalidHalfmoveClock(token.to_string()))?,
            None => 0,
        };

        // Move number 0 shows up in the wild (and in our default FEN); it
        // means the same as 1.
        let fullmove_number = match parts.next() {
            Some(token) => token
                .parse::<u32>()
                .ok()
                .filter(|&n| n <= MAX_FULLMOVE_NUMBER)
                .ok_or_else(|| FenError::InvalidFullmoveNumber(token.to_string()))?
                .max(1),
            None => 1,
        };

        let rest: Vec<&str> = parts.collect();
        if !rest.is_empty() {
            return Err(FenError::TrailingInput(rest.join(" ")));
        }

        Ok(Fen {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Number of halfmoves played before this position.
    pub fn ply(&self) -> u32 {
        let black = u32::from(self.side_to_move == Color::Black);
        self.fullmove_number
            .saturating_sub(1)
            .saturating_mul(2)
            .saturating_add(black)
    }
}

impl Default for Fen {
    /// The record [`Fen::STARTPOS`] parses to.
    fn default() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = [None; 64];
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            board[file] = Some(Piece::new(kind, Color::White));
            board[8 + file] = Some(Piece::new(PieceKind::Pawn, Color::White));
            board[48 + file] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            board[56 + file] = Some(Piece::new(kind, Color::Black));
        }
        Fen {
            board,
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            let mut empty_count = 0;
            for file in 0..8u8 {
                match self.board[(rank * 8 + file) as usize] {
                    Some(piece) => {
                        if empty_count > 0 {
                            write!(f, "{}", empty_count)?;
                            empty_count = 0;
                        }
                        write!(f, "{}", piece.to_fen_char())?;
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                write!(f, "{}", empty_count)?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }

        let en_passant = match self.en_passant {
            Some(sq) => sq.to_algebraic(),
            None => "-".to_string(),
        };
        write!(
            f,
            " {} {} {} {} {}",
            self.side_to_move.to_fen_char(),
            self.castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

fn parse_placement(placement: &str) -> Result<[Option<Piece>; 64], FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidPiecePlacement(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    let mut board = [None; 64];
    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(run) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                file += run as usize;
            } else if let Some(piece) = Piece::from_fen_char(c) {
                if file < 8 {
                    board[rank * 8 + file] = Some(piece);
                }
                file += 1;
            } else {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "invalid character '{}' in rank {}",
                    c,
                    rank + 1
                )));
            }
            if file > 8 {
                break;
            }
        }
        if file != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "rank {} has {} squares, expected 8",
                rank + 1,
                file
            )));
        }
    }

    for color in [Color::White, Color::Black] {
        let kings = board
            .iter()
            .filter(|sq| **sq == Some(Piece::new(PieceKind::King, color)))
            .count();
        if kings != 1 {
            return Err(FenError::InvalidKingCount(color, kings));
        }
    }

    Ok(board)
}

fn parse_en_passant(token: &str) -> Result<Option<Square>, FenError> {
    if token == "-" {
        return Ok(None);
    }
    match Square::from_algebraic(token) {
        Some(sq) if sq.rank_index() == 2 || sq.rank_index() == 5 => Ok(Some(sq)),
        _ => Err(FenError::InvalidEnPassantSquare(token.to_string())),
    }
}
