//! Core value types: colors, piece types, squares, bitboards and the
//! packed move representation shared by the whole engine.

use std::fmt;
use std::ops::Not;

pub type Bitboard = u64;

pub const FULL_BB: Bitboard = !0;

pub const RANK_1: Bitboard = 0x0000_0000_0000_00FF;
pub const RANK_3: Bitboard = 0x0000_0000_00FF_0000;
pub const RANK_6: Bitboard = 0x0000_FF00_0000_0000;
pub const RANK_8: Bitboard = 0xFF00_0000_0000_0000;

pub const FILE_A: Bitboard = 0x0101_0101_0101_0101;
pub const FILE_H: Bitboard = FILE_A << 7;

#[inline(always)]
pub fn bb(sq: Square) -> Bitboard {
    1u64 << sq.0
}

#[inline(always)]
pub fn lsb(b: Bitboard) -> Square {
    debug_assert!(b != 0);
    Square(b.trailing_zeros() as u8)
}

#[inline(always)]
pub fn msb(b: Bitboard) -> Square {
    debug_assert!(b != 0);
    Square(63 - b.leading_zeros() as u8)
}

#[inline(always)]
pub fn pop_lsb(b: &mut Bitboard) -> Square {
    let sq = lsb(*b);
    *b &= *b - 1;
    sq
}

#[inline(always)]
pub fn more_than_one(b: Bitboard) -> bool {
    b & b.wrapping_sub(1) != 0
}

/// Iterate over the set squares of a bitboard.
pub struct BitIter(pub Bitboard);

impl Iterator for BitIter {
    type Item = Square;

    #[inline(always)]
    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(pop_lsb(&mut self.0))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    #[inline(always)]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub const BOTH: [Color; 2] = [Color::White, Color::Black];
}

impl Not for Color {
    type Output = Color;

    #[inline(always)]
    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    #[inline(always)]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> PieceType {
        Self::ALL[i]
    }

    pub fn to_char(self, c: Color) -> char {
        let ch = match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        };
        if c == Color::White {
            ch.to_ascii_uppercase()
        } else {
            ch
        }
    }
}

/// A board square, 0..64 with a1 = 0 and h8 = 63.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(pub u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);

    #[inline(always)]
    pub fn new(file: u8, rank: u8) -> Square {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    #[inline(always)]
    pub fn idx(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub fn file(self) -> u8 {
        self.0 & 7
    }

    #[inline(always)]
    pub fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// Vertical flip, used for the black NNUE perspective.
    #[inline(always)]
    pub fn flip_rank(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// Horizontal mirror, used for king-relative feature mirroring.
    #[inline(always)]
    pub fn flip_file(self) -> Square {
        Square(self.0 ^ 7)
    }

    #[inline(always)]
    pub fn offset(self, d: i8) -> Square {
        Square((self.0 as i8 + d) as u8)
    }

    /// Relative square from `c`'s point of view (a1 stays a1 for white).
    #[inline(always)]
    pub fn relative(self, c: Color) -> Square {
        if c == Color::White {
            self
        } else {
            self.flip_rank()
        }
    }

    pub fn parse(s: &str) -> Option<Square> {
        let b = s.as_bytes();
        if b.len() != 2 || !(b'a'..=b'h').contains(&b[0]) || !(b'1'..=b'8').contains(&b[1]) {
            return None;
        }
        Some(Square::new(b[0] - b'a', b[1] - b'1'))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

/// Move flag, stored in the two high bits of the packed move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum MoveFlag {
    Normal = 0b00 << 14,
    Castling = 0b01 << 14,
    EnPassant = 0b10 << 14,
    Promotion = 0b11 << 14,
}

/// A move packed into 16 bits: from (0..6), to (6..12), promotion piece
/// (12..14, knight..queen) and the flag (14..16). The all-zero value is
/// the null move.
///
/// Castling is encoded as "king takes own rook" so that standard and
/// Chess960 starts are handled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move(pub u16);

impl Move {
    pub const NULL: Move = Move(0);

    #[inline(always)]
    pub fn new(from: Square, to: Square, flag: MoveFlag) -> Move {
        Move(from.0 as u16 | ((to.0 as u16) << 6) | flag as u16)
    }

    #[inline(always)]
    pub fn promotion(from: Square, to: Square, promo: PieceType) -> Move {
        debug_assert!(promo >= PieceType::Knight && promo <= PieceType::Queen);
        Move(
            from.0 as u16
                | ((to.0 as u16) << 6)
                | (((promo as u16) - 1) << 12)
                | MoveFlag::Promotion as u16,
        )
    }

    #[inline(always)]
    pub fn from(self) -> Square {
        Square((self.0 & 0x3F) as u8)
    }

    #[inline(always)]
    pub fn to(self) -> Square {
        Square(((self.0 >> 6) & 0x3F) as u8)
    }

    #[inline(always)]
    pub fn flag(self) -> MoveFlag {
        match self.0 >> 14 {
            0b00 => MoveFlag::Normal,
            0b01 => MoveFlag::Castling,
            0b10 => MoveFlag::EnPassant,
            _ => MoveFlag::Promotion,
        }
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn is_castling(self) -> bool {
        self.flag() == MoveFlag::Castling
    }

    #[inline(always)]
    pub fn is_en_passant(self) -> bool {
        self.flag() == MoveFlag::EnPassant
    }

    #[inline(always)]
    pub fn is_promotion(self) -> bool {
        self.flag() == MoveFlag::Promotion
    }

    #[inline(always)]
    pub fn promo_type(self) -> PieceType {
        PieceType::from_index((((self.0 >> 12) & 0b11) + 1) as usize)
    }

    /// from*64+to style index into butterfly-shaped tables.
    #[inline(always)]
    pub fn butterfly(self) -> usize {
        (self.0 & 0x0FFF) as usize
    }
}

pub const MAX_PLY: usize = 128;
pub const MAX_MOVES: usize = 256;

pub const SCORE_MATE: i32 = 32_000 + MAX_PLY as i32;
pub const SCORE_MATE_IN_MAX: i32 = 32_000;
pub const SCORE_DRAW: i32 = 0;
pub const SCORE_EVAL_MAX: i32 = 30_000;

/// Sentinel for "search aborted": propagated up the tree, never stored
/// in the transposition table or the history tables.
pub const SCORE_TIMEOUT: i32 = SCORE_MATE + 1000;

#[inline(always)]
pub fn is_terminal_score(score: i32) -> bool {
    score.abs() > SCORE_EVAL_MAX && score.abs() <= SCORE_MATE
}

#[inline(always)]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= SCORE_MATE_IN_MAX && score.abs() <= SCORE_MATE
}

#[inline(always)]
pub fn mated_in(ply: usize) -> i32 {
    -SCORE_MATE + ply as i32
}

#[inline(always)]
pub fn mate_in(ply: usize) -> i32 {
    SCORE_MATE - ply as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_packing_roundtrip() {
        let m = Move::new(Square::parse("e2").unwrap(), Square::parse("e4").unwrap(), MoveFlag::Normal);
        assert_eq!(m.from(), Square(12));
        assert_eq!(m.to(), Square(28));
        assert_eq!(m.flag(), MoveFlag::Normal);
        assert!(!m.is_null());

        let p = Move::promotion(Square(48), Square(56), PieceType::Queen);
        assert!(p.is_promotion());
        assert_eq!(p.promo_type(), PieceType::Queen);

        let n = Move::promotion(Square(48), Square(56), PieceType::Knight);
        assert_eq!(n.promo_type(), PieceType::Knight);
    }

    #[test]
    fn square_display_and_parse() {
        for s in ["a1", "h8", "e4", "c7"] {
            let sq = Square::parse(s).unwrap();
            assert_eq!(sq.to_string(), s);
        }
        assert!(Square::parse("i9").is_none());
        assert!(Square::parse("a0").is_none());
    }

    #[test]
    fn bit_helpers() {
        let mut b: Bitboard = 0b1010_1000;
        assert_eq!(lsb(b), Square(3));
        assert_eq!(msb(b), Square(7));
        assert!(more_than_one(b));
        assert_eq!(pop_lsb(&mut b), Square(3));
        assert_eq!(BitIter(b).count(), 2);
    }
}
