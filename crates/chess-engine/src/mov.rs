//! Move representation.

use crate::Position;
use chess_core::{CastlingRights, Piece, PieceKind, Square};
use std::fmt;

/// A chess move, as produced by move generation.
///
/// Besides source and target, a move carries the state it destroys (the
/// captured piece, the castling rights, the en passant target and the
/// halfmove clock before it was played), so [`Position::undo_move`] can
/// reverse it without recomputing anything from the resulting position.
/// Keep the value around if you intend to undo it.
///
/// Moves cannot be built by hand; take them from [`Position::legal_moves`]
/// or [`Position::san_to_move`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    piece: Piece,
    captured: Option<Piece>,
    capture_square: Option<Square>,
    promotion: Option<Piece>,
    castling_before: CastlingRights,
    en_passant_before: Option<Square>,
    halfmove_clock_before: u32,
    en_passant_after: Option<Square>,
}

impl Move {
    /// Creates a move of `piece` from `from` to `to`, snapshotting the
    /// position state it will overwrite. Whatever stands on `to` is the
    /// captured piece.
    pub(crate) fn new(position: &Position, piece: Piece, from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            piece,
            captured: position.piece_at(to),
            capture_square: None,
            promotion: None,
            castling_before: position.castling,
            en_passant_before: position.en_passant,
            halfmove_clock_before: position.halfmove_clock,
            en_passant_after: None,
        }
    }

    pub(crate) fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(Piece::new(kind, self.piece.color));
        self
    }

    /// Marks an en passant capture of `pawn` standing on `square`.
    pub(crate) fn with_en_passant_capture(mut self, square: Square, pawn: Piece) -> Self {
        self.captured = Some(pawn);
        self.capture_square = Some(square);
        self
    }

    /// Records the en passant target this move creates (double pushes only).
    pub(crate) fn with_en_passant_target(mut self, target: Square) -> Self {
        self.en_passant_after = Some(target);
        self
    }

    /// Returns the source square.
    #[inline]
    pub const fn from(&self) -> Square {
        self.from
    }

    /// Returns the destination square.
    #[inline]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// The piece that moves (a pawn, for promotions).
    #[inline]
    pub const fn piece(&self) -> Piece {
        self.piece
    }

    /// The piece removed from the board by this move, if any.
    #[inline]
    pub const fn captured(&self) -> Option<Piece> {
        self.captured
    }

    /// Square of the captured pawn for en passant; `None` for every other move.
    #[inline]
    pub const fn capture_square(&self) -> Option<Square> {
        self.capture_square
    }

    /// The piece a pawn turns into, color-matched to the mover.
    #[inline]
    pub const fn promotion(&self) -> Option<Piece> {
        self.promotion
    }

    #[inline]
    pub const fn castling_before(&self) -> CastlingRights {
        self.castling_before
    }

    #[inline]
    pub const fn en_passant_before(&self) -> Option<Square> {
        self.en_passant_before
    }

    #[inline]
    pub const fn halfmove_clock_before(&self) -> u32 {
        self.halfmove_clock_before
    }

    /// En passant target left behind by this move.
    #[inline]
    pub const fn en_passant_after(&self) -> Option<Square> {
        self.en_passant_after
    }

    #[inline]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline]
    pub const fn is_en_passant(&self) -> bool {
        self.capture_square.is_some()
    }

    /// A king stepping two files from the e-file.
    pub fn is_castling(&self) -> bool {
        self.piece.kind == PieceKind::King
            && self.from.file_index() == 4
            && self.from.file_index().abs_diff(self.to.file_index()) == 2
    }

    /// Source and destination of the rook that moves along with a castling king.
    pub fn castling_rook(&self) -> Option<(Square, Square)> {
        if !self.is_castling() {
            return None;
        }
        let rank = self.from.rank_index();
        let (rook_from, rook_to) = if self.to.file_index() > self.from.file_index() {
            (7, 5)
        } else {
            (0, 3)
        };
        Some((
            Square::from_coords(rook_from, rank)?,
            Square::from_coords(rook_to, rank)?,
        ))
    }

    /// Long algebraic notation, e.g. "e2e4" or "e7e8q".
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(p) => format!(
                "{}{}{}",
                self.from,
                self.to,
                p.kind.san_char().to_ascii_lowercase()
            ),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}
