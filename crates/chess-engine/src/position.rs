//! Chess position representation.

use chess_core::{CastlingRights, Color, Fen, FenError, Piece, PieceKind, Square};
use std::fmt;

/// Complete, mutable chess position state.
///
/// Equality covers every field, so `apply_move` followed by `undo_move`
/// can be checked with a plain `assert_eq!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// Square contents indexed by [`Square::index`].
    board: [Option<Piece>; 64],

    /// The side to move.
    pub side_to_move: Color,

    /// Castling rights.
    pub castling: CastlingRights,

    /// En passant target square (if any).
    pub en_passant: Option<Square>,

    /// Halfmoves since the last capture or pawn move.
    pub halfmove_clock: u32,

    /// Halfmoves played since the start of the game.
    pub ply_count: u32,
}

impl Position {
    /// Creates an empty board, White to move, no rights.
    pub fn empty() -> Self {
        Position {
            board: [None; 64],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            ply_count: 0,
        }
    }

    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        Self::from(Fen::default())
    }

    /// Creates a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Fen::parse(fen).map(Self::from)
    }

    /// Converts the position to a FEN string.
    ///
    /// The move number is derived from the ply count, so a parsed move
    /// number of 0 comes back as 1.
    pub fn to_fen(&self) -> String {
        Fen {
            board: self.board,
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number(),
        }
        .to_string()
    }

    /// Returns the piece at the given square, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index() as usize]
    }

    /// Puts `piece` on `sq` (or clears it), returning what stood there.
    #[inline]
    pub(crate) fn set_piece(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.board[sq.index() as usize], piece)
    }

    /// Locates the king of the given color.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Some(Piece::new(PieceKind::King, color));
        Square::all_by_file().find(|&sq| self.piece_at(sq) == king)
    }

    /// Fullmove number as written in FEN (starts at 1).
    pub fn fullmove_number(&self) -> u32 {
        self.ply_count / 2 + 1
    }

    /// Renders the board as an 8x8 grid, rank 8 at the top.
    ///
    /// Each square is its FEN letter (or a space) followed by `|`.
    pub fn ascii_board(&self) -> String {
        let mut out = String::with_capacity(8 * 17);
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let c = Square::from_coords(file, rank)
                    .and_then(|sq| self.piece_at(sq))
                    .map_or(' ', |p| p.to_fen_char());
                out.push(c);
                out.push('|');
            }
            out.push('\n');
        }
        out
    }
}

impl From<Fen> for Position {
    fn from(fen: Fen) -> Self {
        let ply_count = fen.ply();
        Position {
            board: fen.board,
            side_to_move: fen.side_to_move,
            castling: fen.castling,
            en_passant: fen.en_passant,
            halfmove_clock: fen.halfmove_clock,
            ply_count,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ascii_board())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{File, Rank};

    const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn startpos_state() {
        let pos = Position::startpos();
        assert_eq!(pos.to_fen(), STARTPOS_FEN);
        assert_eq!(pos.side_to_move, Color::White);
        assert_eq!(pos.castling, CastlingRights::ALL);
        assert_eq!(pos.ply_count, 0);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn custom_fen_roundtrip() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.ply_count, 4);
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn black_to_move_ply() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.side_to_move, Color::Black);
        assert_eq!(pos.ply_count, 1);
        assert_eq!(pos.en_passant, Square::from_algebraic("e3"));
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn piece_at() {
        let pos = Position::startpos();
        assert_eq!(
            pos.piece_at(Square::E1),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            pos.piece_at(Square::D8),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert_eq!(pos.piece_at(Square::new(File::E, Rank::R4)), None);
    }

    #[test]
    fn king_square() {
        let pos = Position::from_fen("8/8/3k4/8/8/8/8/6K1 w - - 0 1").unwrap();
        assert_eq!(pos.king_square(Color::White), Some(Square::G1));
        assert_eq!(pos.king_square(Color::Black), Square::from_algebraic("d6"));
        assert_eq!(Position::empty().king_square(Color::White), None);
    }

    #[test]
    fn set_piece_returns_previous() {
        let mut pos = Position::startpos();
        let old = pos.set_piece(Square::E1, None);
        assert_eq!(old, Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(pos.piece_at(Square::E1), None);
    }

    #[test]
    fn ascii_board_layout() {
        let board = Position::startpos().ascii_board();
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "r|n|b|q|k|b|n|r|");
        assert_eq!(lines[1], "p|p|p|p|p|p|p|p|");
        assert_eq!(lines[4], " | | | | | | | |");
        assert_eq!(lines[7], "R|N|B|Q|K|B|N|R|");
        assert_eq!(format!("{}", Position::startpos()), board);
    }

    #[test]
    fn invalid_fen_is_rejected() {
        assert!(Position::from_fen("8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").is_err());
    }

    #[test]
    fn position_empty() {
        let pos = Position::empty();
        assert_eq!(pos.side_to_move, Color::White);
        assert_eq!(pos.castling, CastlingRights::NONE);
        assert_eq!(pos.en_passant, None);
        assert!(Square::all_by_file().all(|sq| pos.piece_at(sq).is_none()));
    }
}
