//! Castling bookkeeping.
//!
//! Castling moves are encoded as "king takes own rook", which covers both
//! the standard start and randomized (Chess960) starts with one code
//! path. The per-position tables below are rebuilt from the actual king
//! and rook placement whenever a new position is set up.

use crate::types::{bb, lsb, msb, Bitboard, Color, Square, RANK_1, RANK_8};

use super::attacks;
use super::Position;

pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;

const MASKS: [u8; 4] = [
    WHITE_KINGSIDE,
    WHITE_QUEENSIDE,
    BLACK_KINGSIDE,
    BLACK_QUEENSIDE,
];

#[inline(always)]
pub fn castle_idx(c: Color, kingside: bool) -> usize {
    c.idx() * 2 + usize::from(!kingside)
}

#[inline(always)]
pub fn right_mask(c: Color, kingside: bool) -> u8 {
    MASKS[castle_idx(c, kingside)]
}

/// Where the king ends up after castling.
#[inline(always)]
pub fn king_destination(c: Color, kingside: bool) -> Square {
    let sq = if kingside { Square::G1 } else { Square::C1 };
    sq.relative(c)
}

/// Where the rook ends up after castling.
#[inline(always)]
pub fn rook_destination(c: Color, kingside: bool) -> Square {
    let sq = if kingside { Square::F1 } else { Square::D1 };
    sq.relative(c)
}

/// Per-position castling tables, carried inside `Position` by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastlingInfo {
    /// `rights &= modifier[from] & modifier[to]` after every move: moving
    /// the king or a rook, or capturing a rook, drops the right.
    pub modifier: [u8; 64],
    /// Start square of the castling rook per castling index (also the
    /// `to` square of the encoded king-takes-rook move).
    pub rook_start: [Square; 4],
    pub king_start: [Square; 2],
    /// Squares that must be empty (king and rook start squares excluded).
    pub path: [Bitboard; 4],
}

impl Default for CastlingInfo {
    fn default() -> Self {
        CastlingInfo {
            modifier: [0xFF; 64],
            rook_start: [Square(0); 4],
            king_start: [Square(0); 2],
            path: [0; 4],
        }
    }
}

impl CastlingInfo {
    /// Rebuild the tables for a freshly parsed position. Assumes the
    /// position's castling rights and king squares are already set.
    pub fn rebuild(p: &Position) -> CastlingInfo {
        let mut info = CastlingInfo::default();

        info.king_start[Color::White.idx()] = p.king_sq(Color::White);
        info.king_start[Color::Black.idx()] = p.king_sq(Color::Black);

        for c in Color::BOTH {
            for kingside in [true, false] {
                if !p.has_castling_right(c, kingside) {
                    continue;
                }
                let idx = castle_idx(c, kingside);
                let back_rank = if c == Color::White { RANK_1 } else { RANK_8 };
                let rooks = p.pieces(c, crate::types::PieceType::Rook) & back_rank;
                debug_assert!(rooks != 0, "castling right without a back-rank rook");

                let rook = if kingside { msb(rooks) } else { lsb(rooks) };
                let king = p.king_sq(c);
                let k_dest = king_destination(c, kingside);
                let r_dest = rook_destination(c, kingside);

                info.rook_start[idx] = rook;
                info.modifier[rook.idx()] &= !MASKS[idx];
                info.modifier[king.idx()] &= !MASKS[idx];

                // computed piecewise because (d)frc king/rook start
                // squares can sit anywhere on the back rank
                info.path[idx] = (attacks::between(king, k_dest)
                    | bb(k_dest)
                    | attacks::between(rook, r_dest)
                    | bb(r_dest))
                    & !bb(king)
                    & !bb(rook);
            }
        }

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_are_relative() {
        assert_eq!(king_destination(Color::White, true), Square::G1);
        assert_eq!(king_destination(Color::Black, true).to_string(), "g8");
        assert_eq!(rook_destination(Color::White, false), Square::D1);
        assert_eq!(rook_destination(Color::Black, false).to_string(), "d8");
    }

    #[test]
    fn right_masks_are_disjoint() {
        let mut seen = 0u8;
        for c in Color::BOTH {
            for ks in [true, false] {
                let m = right_mask(c, ks);
                assert_eq!(seen & m, 0);
                seen |= m;
            }
        }
        assert_eq!(seen, 0b1111);
    }
}
