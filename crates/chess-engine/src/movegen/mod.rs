//! Move generation.
//!
//! Generation works square by square on the mailbox board. Pseudo-legal
//! moves follow piece movement rules only; legal moves are filtered by
//! playing each candidate on a scratch copy of the position, testing
//! whether the mover's king is attacked, and taking the move back.

mod make;
pub mod perft;

use crate::{Move, Position};
use chess_core::{Color, Piece, PieceKind, Square};

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

impl Position {
    /// Every move the piece on `from` could make, ignoring whether it leaves
    /// its own king in check. Empty if the square is empty.
    pub fn pseudo_legal_moves(&self, from: Square) -> Vec<Move> {
        self.generate_from(from, true)
    }

    /// Like [`pseudo_legal_moves`](Self::pseudo_legal_moves) but never
    /// produces castling. Attack detection uses this form, since castling
    /// legality itself depends on attack detection.
    pub fn pseudo_legal_moves_without_castling(&self, from: Square) -> Vec<Move> {
        self.generate_from(from, false)
    }

    fn generate_from(&self, from: Square, with_castling: bool) -> Vec<Move> {
        let mut moves = Vec::new();
        let Some(piece) = self.piece_at(from) else {
            return moves;
        };

        match piece.kind {
            PieceKind::Rook => self.push_slides(piece, from, &ROOK_DIRECTIONS, &mut moves),
            PieceKind::Bishop => self.push_slides(piece, from, &BISHOP_DIRECTIONS, &mut moves),
            PieceKind::Queen => {
                self.push_slides(piece, from, &ROOK_DIRECTIONS, &mut moves);
                self.push_slides(piece, from, &BISHOP_DIRECTIONS, &mut moves);
            }
            PieceKind::Knight => self.push_steps(piece, from, &KNIGHT_OFFSETS, &mut moves),
            PieceKind::King => {
                self.push_steps(piece, from, &KING_OFFSETS, &mut moves);
                if with_castling {
                    self.push_castling(piece, from, &mut moves);
                }
            }
            PieceKind::Pawn => self.push_pawn_moves(piece, from, &mut moves),
        }

        moves
    }

    /// Walks each ray until the edge or the first piece; an enemy blocker is
    /// included as a capture.
    fn push_slides(&self, piece: Piece, from: Square, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                match self.piece_at(to) {
                    None => moves.push(Move::new(self, piece, from, to)),
                    Some(other) => {
                        if other.color != piece.color {
                            moves.push(Move::new(self, piece, from, to));
                        }
                        break;
                    }
                }
                current = to;
            }
        }
    }

    fn push_steps(&self, piece: Piece, from: Square, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in offsets {
            let Some(to) = from.offset(df, dr) else {
                continue;
            };
            if self.piece_at(to).map_or(true, |other| other.color != piece.color) {
                moves.push(Move::new(self, piece, from, to));
            }
        }
    }

    /// Castling from the king's home square: the right must be held, the
    /// rook must stand in its corner, every square between king and rook must
    /// be empty, and the king may not start on, cross, or land on an attacked
    /// square. Kingside first.
    fn push_castling(&self, king: Piece, from: Square, moves: &mut Vec<Move>) {
        let color = king.color;
        let rank = color.back_rank();
        if from != home(4, rank) {
            return;
        }
        let them = color.opposite();
        let rook = Some(Piece::new(PieceKind::Rook, color));
        let is_empty = |file: u8| self.piece_at(home(file, rank)).is_none();
        let is_safe = |file: u8| !self.attacked_square(home(file, rank), them);

        if self.castling.can_castle_kingside(color)
            && self.piece_at(home(7, rank)) == rook
            && is_empty(5)
            && is_empty(6)
            && is_safe(4)
            && is_safe(5)
            && is_safe(6)
        {
            moves.push(Move::new(self, king, from, home(6, rank)));
        }

        if self.castling.can_castle_queenside(color)
            && self.piece_at(home(0, rank)) == rook
            && is_empty(1)
            && is_empty(2)
            && is_empty(3)
            && is_safe(4)
            && is_safe(3)
            && is_safe(2)
        {
            moves.push(Move::new(self, king, from, home(2, rank)));
        }
    }

    /// Single push, double push, then captures toward the a-file and the
    /// h-file, each followed by its en passant variant.
    fn push_pawn_moves(&self, pawn: Piece, from: Square, moves: &mut Vec<Move>) {
        let color = pawn.color;
        let dir = color.pawn_direction();

        if let Some(one) = from.offset(0, dir) {
            if self.piece_at(one).is_none() {
                push_pawn_move(Move::new(self, pawn, from, one), color, moves);

                if from.rank_index() == color.pawn_rank() {
                    if let Some(two) = from.offset(0, 2 * dir) {
                        if self.piece_at(two).is_none() {
                            moves.push(
                                Move::new(self, pawn, from, two).with_en_passant_target(one),
                            );
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            let Some(to) = from.offset(df, dir) else {
                continue;
            };
            match self.piece_at(to) {
                Some(target) if target.color != color => {
                    push_pawn_move(Move::new(self, pawn, from, to), color, moves);
                }
                Some(_) => {}
                None if self.en_passant == Some(to) => {
                    let victim = Piece::new(PieceKind::Pawn, color.opposite());
                    if let Some(behind) = to.offset(0, -dir) {
                        if self.piece_at(behind) == Some(victim) {
                            moves.push(
                                Move::new(self, pawn, from, to)
                                    .with_en_passant_capture(behind, victim),
                            );
                        }
                    }
                }
                None => {}
            }
        }
    }

    /// Whether the piece on `from` attacks `target`.
    ///
    /// Pawns attack their two forward diagonals whether or not anything
    /// stands there; every other piece attacks exactly its pseudo-legal
    /// targets (castling excluded).
    fn attacks(&self, piece: Piece, from: Square, target: Square) -> bool {
        if piece.kind == PieceKind::Pawn {
            let dir = piece.color.pawn_direction();
            return from.offset(-1, dir) == Some(target) || from.offset(1, dir) == Some(target);
        }
        self.pseudo_legal_moves_without_castling(from)
            .iter()
            .any(|m| m.to() == target)
    }

    /// Returns true if any piece of `by` attacks `sq`.
    pub fn attacked_square(&self, sq: Square, by: Color) -> bool {
        Square::all_by_file().any(|from| match self.piece_at(from) {
            Some(piece) if piece.color == by => self.attacks(piece, from, sq),
            _ => false,
        })
    }

    /// Returns true if the king of `color` is attacked. A side without a
    /// king is never in check.
    pub fn in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .map_or(false, |king| self.attacked_square(king, color.opposite()))
    }

    /// Legal moves of the piece on `sq`.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        let Some(piece) = self.piece_at(sq) else {
            return Vec::new();
        };
        let mut scratch = self.clone();
        scratch.retain_legal(self.pseudo_legal_moves(sq), piece.color)
    }

    /// All legal moves for the side to move.
    ///
    /// Sources are visited file by file (a1, a2, ..., a8, b1, ...), and each
    /// source contributes its moves in generation order, so the list is
    /// stable for a given position.
    pub fn legal_moves(&self) -> Vec<Move> {
        let us = self.side_to_move;
        let mut scratch = self.clone();
        let mut moves = Vec::new();
        for sq in Square::all_by_file() {
            if self.piece_at(sq).map_or(false, |p| p.color == us) {
                moves.extend(scratch.retain_legal(self.pseudo_legal_moves(sq), us));
            }
        }
        moves
    }

    /// Returns true if the side to move has at least one legal move.
    pub fn has_legal_moves(&self) -> bool {
        let us = self.side_to_move;
        let mut scratch = self.clone();
        Square::all_by_file().any(|sq| {
            self.piece_at(sq).map_or(false, |p| p.color == us)
                && self
                    .pseudo_legal_moves(sq)
                    .iter()
                    .any(|m| scratch.is_safe_after(m, us))
        })
    }

    /// Returns true if the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.in_check(self.side_to_move) && !self.has_legal_moves()
    }

    /// Returns true if the side to move is stalemated.
    pub fn is_stalemate(&self) -> bool {
        !self.in_check(self.side_to_move) && !self.has_legal_moves()
    }

    fn retain_legal(&mut self, moves: Vec<Move>, mover: Color) -> Vec<Move> {
        moves
            .into_iter()
            .filter(|m| self.is_safe_after(m, mover))
            .collect()
    }

    /// Plays `m`, checks the mover's king, and takes the move back.
    fn is_safe_after(&mut self, m: &Move, mover: Color) -> bool {
        self.apply_move(m);
        let safe = !self.in_check(mover);
        self.undo_move(m);
        safe
    }
}

/// Pushes `m`, expanded into the four promotions when it lands on the last rank.
fn push_pawn_move(m: Move, color: Color, moves: &mut Vec<Move>) {
    if m.to().rank_index() == color.promotion_rank() {
        moves.extend(PieceKind::PROMOTIONS.iter().map(|&kind| m.with_promotion(kind)));
    } else {
        moves.push(m);
    }
}

/// A square on a back rank. Callers only pass file and rank indices in 0..8.
fn home(file: u8, rank: u8) -> Square {
    Square::from_coords(file, rank).unwrap_or(Square::A1)
}
