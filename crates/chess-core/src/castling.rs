//! Castling rights.

use crate::{Color, Square};
use std::fmt;

/// The four independent castling rights, stored as flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Creates new castling rights from flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    const fn kingside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    const fn queenside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns true if the given side may still castle kingside.
    #[inline]
    pub const fn can_castle_kingside(self, color: Color) -> bool {
        self.0 & Self::kingside_flag(color) != 0
    }

    /// Returns true if the given side may still castle queenside.
    #[inline]
    pub const fn can_castle_queenside(self, color: Color) -> bool {
        self.0 & Self::queenside_flag(color) != 0
    }

    /// Removes both rights for a color.
    #[inline]
    pub fn remove_color(&mut self, color: Color) {
        self.0 &= !(Self::kingside_flag(color) | Self::queenside_flag(color));
    }

    /// Removes kingside castling for a color.
    #[inline]
    pub fn remove_kingside(&mut self, color: Color) {
        self.0 &= !Self::kingside_flag(color);
    }

    /// Removes queenside castling for a color.
    #[inline]
    pub fn remove_queenside(&mut self, color: Color) {
        self.0 &= !Self::queenside_flag(color);
    }

    /// Drops whichever rights depend on a piece standing on `sq`.
    ///
    /// Keyed on the square alone: e1/e8 clear both rights of that color,
    /// the four corners clear the right of the rook that starts there.
    pub fn remove_for_square(&mut self, sq: Square) {
        match sq {
            Square::E1 => self.remove_color(Color::White),
            Square::E8 => self.remove_color(Color::Black),
            Square::A1 => self.remove_queenside(Color::White),
            Square::H1 => self.remove_kingside(Color::White),
            Square::A8 => self.remove_queenside(Color::Black),
            Square::H8 => self.remove_kingside(Color::Black),
            _ => {}
        }
    }

    /// Parses the FEN castling field ("KQkq", a subset of it, or "-").
    pub fn from_fen_field(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(Self::NONE);
        }
        if field.is_empty() {
            return None;
        }
        let mut flags = 0u8;
        for c in field.chars() {
            flags |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => return None,
            };
        }
        Some(CastlingRights(flags))
    }
}

impl fmt::Display for CastlingRights {
    /// Writes the FEN castling field.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        let letters = [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ];
        for (flag, letter) in letters {
            if self.0 & flag != 0 {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}
