//! Applying and reversing moves in place.

use crate::{Move, Position};
use chess_core::PieceKind;

impl Position {
    /// Plays a move produced by generation on this position.
    pub fn apply_move(&mut self, m: &Move) {
        let from = m.from();
        let to = m.to();
        let piece = m.piece();

        self.set_piece(from, None);
        self.set_piece(to, Some(m.promotion().unwrap_or(piece)));
        if let Some(captured_on) = m.capture_square() {
            self.set_piece(captured_on, None);
        }

        if let Some((rook_from, rook_to)) = m.castling_rook() {
            let rook = self.set_piece(rook_from, None);
            self.set_piece(rook_to, rook);
        }

        // Rights are keyed on squares: whatever leaves a king or rook home
        // square, or captures on a rook's corner, ends that right for good.
        if piece.kind == PieceKind::King {
            self.castling.remove_color(piece.color);
        }
        self.castling.remove_for_square(from);
        if m.is_capture() {
            self.castling.remove_for_square(to);
        }

        if m.is_capture() || piece.kind == PieceKind::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        self.en_passant = m.en_passant_after();
        self.ply_count = self.ply_count.saturating_add(1);
        self.side_to_move = self.side_to_move.opposite();
    }

    /// Takes back `m`, which must be the last move applied to this position.
    ///
    /// Restores the board, castling rights, en passant target, clocks and
    /// side to move exactly as they were before [`apply_move`](Self::apply_move).
    pub fn undo_move(&mut self, m: &Move) {
        let from = m.from();
        let to = m.to();

        self.side_to_move = self.side_to_move.opposite();
        self.ply_count = self.ply_count.saturating_sub(1);

        if let Some((rook_from, rook_to)) = m.castling_rook() {
            let rook = self.set_piece(rook_to, None);
            self.set_piece(rook_from, rook);
        }

        self.set_piece(to, None);
        self.set_piece(from, Some(m.piece()));
        if let Some(captured) = m.captured() {
            self.set_piece(m.capture_square().unwrap_or(to), Some(captured));
        }

        self.castling = m.castling_before();
        self.en_passant = m.en_passant_before();
        self.halfmove_clock = m.halfmove_clock_before();
    }
}

#[cfg(test)]
mod tests {
    use crate::Position;
    use chess_core::{CastlingRights, Color, Piece, PieceKind, Square};

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn find(position: &Position, uci: &str) -> crate::Move {
        position
            .legal_moves()
            .into_iter()
            .find(|m| m.to_uci() == uci)
            .unwrap_or_else(|| panic!("{} is not legal", uci))
    }

    fn assert_roundtrip(fen: &str, uci: &str) -> Position {
        let original = Position::from_fen(fen).unwrap();
        let mut position = original.clone();
        let m = find(&position, uci);
        position.apply_move(&m);
        let after = position.clone();
        position.undo_move(&m);
        assert_eq!(position, original, "undo of {} did not restore {}", uci, fen);
        after
    }

    #[test]
    fn pawn_double_push() {
        let after = assert_roundtrip(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 5 1",
            "e2e4",
        );
        assert_eq!(after.side_to_move, Color::Black);
        assert_eq!(after.en_passant, Some(sq("e3")));
        assert_eq!(after.halfmove_clock, 0);
        assert_eq!(after.ply_count, 1);
        assert_eq!(after.piece_at(sq("e2")), None);
        assert_eq!(
            after.piece_at(sq("e4")),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
    }

    #[test]
    fn quiet_move_clears_en_passant_and_ticks_clock() {
        let after = assert_roundtrip(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 3 1",
            "g8f6",
        );
        assert_eq!(after.en_passant, None);
        assert_eq!(after.halfmove_clock, 4);
        assert_eq!(after.fullmove_number(), 2);
    }

    #[test]
    fn clocks_saturate_at_their_limit() {
        let fen = format!("4k3/8/8/8/8/8/8/4K2R w K - {} 1", u32::MAX);
        let mut position = Position::from_fen(&fen).unwrap();
        let m = find(&position, "e1d1");
        position.apply_move(&m);
        assert_eq!(position.halfmove_clock, u32::MAX);
        position.undo_move(&m);
        assert_eq!(position, Position::from_fen(&fen).unwrap());

        let mut position = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        position.ply_count = u32::MAX;
        let m = find(&position, "e1d1");
        position.apply_move(&m);
        assert_eq!(position.ply_count, u32::MAX);
        assert_eq!(position.fullmove_number(), u32::MAX / 2 + 1);
    }

    #[test]
    fn en_passant_removes_pawn_behind_target() {
        let after = assert_roundtrip("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2", "e5d6");
        assert_eq!(after.piece_at(sq("d5")), None);
        assert_eq!(
            after.piece_at(sq("d6")),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
    }

    #[test]
    fn kingside_castling_moves_rook() {
        let after = assert_roundtrip("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1");
        assert_eq!(
            after.piece_at(Square::F1),
            Some(Piece::new(PieceKind::Rook, Color::White))
        );
        assert_eq!(after.piece_at(Square::H1), None);
        assert!(!after.castling.can_castle_kingside(Color::White));
        assert!(!after.castling.can_castle_queenside(Color::White));
        assert!(after.castling.can_castle_kingside(Color::Black));
    }

    #[test]
    fn queenside_castling_moves_rook() {
        let after = assert_roundtrip("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1", "e8c8");
        assert_eq!(
            after.piece_at(Square::D8),
            Some(Piece::new(PieceKind::Rook, Color::Black))
        );
        assert_eq!(after.piece_at(Square::A8), None);
        assert_eq!(
            after.castling,
            CastlingRights::new(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE)
        );
    }

    #[test]
    fn rook_departure_clears_one_right() {
        let after = assert_roundtrip("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1", "h8h5");
        assert!(!after.castling.can_castle_kingside(Color::Black));
        assert!(after.castling.can_castle_queenside(Color::Black));
    }

    #[test]
    fn capturing_a_rook_clears_its_right() {
        let after = assert_roundtrip("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "a1a8");
        assert!(!after.castling.can_castle_queenside(Color::White));
        assert!(!after.castling.can_castle_queenside(Color::Black));
        assert!(after.castling.can_castle_kingside(Color::Black));
        assert_eq!(after.halfmove_clock, 0);
    }

    #[test]
    fn promotion_with_capture_reverts_to_pawn() {
        let after = assert_roundtrip("1n2k3/P7/8/8/8/8/8/4K3 w - - 9 1", "a7b8q");
        assert_eq!(
            after.piece_at(sq("b8")),
            Some(Piece::new(PieceKind::Queen, Color::White))
        );
        assert_eq!(after.piece_at(sq("a7")), None);
        assert_eq!(after.halfmove_clock, 0);
    }

    #[test]
    fn black_promotion_piece_is_black() {
        let after = assert_roundtrip("4k3/8/8/8/8/8/p7/4K3 b - - 0 1", "a2a1n");
        assert_eq!(
            after.piece_at(Square::A1),
            Some(Piece::new(PieceKind::Knight, Color::Black))
        );
    }

    #[test]
    fn every_legal_move_roundtrips() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        ];
        for fen in fens {
            let original = Position::from_fen(fen).unwrap();
            let mut position = original.clone();
            for m in original.legal_moves() {
                position.apply_move(&m);
                position.undo_move(&m);
                assert_eq!(position, original, "{} broke {}", m, fen);
            }
        }
    }
}
