//! Board representation: bitboards, castling state, incremental hash
//! keys and the move-application state machine.

pub mod attacks;
pub mod castling;
pub mod fen;
pub mod makemove;
pub mod zobrist;

use crate::types::{
    bb, more_than_one, Bitboard, Color, Move, PieceType, Square,
};

use castling::CastlingInfo;

/// The full board state machine. Plain value semantics: search nodes copy
/// the parent and apply one move, no position is ever shared mutably
/// between threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    piece_bb: [Bitboard; 6],
    color_bb: [Bitboard; 2],
    king_squares: [Square; 2],

    pub castling_rights: u8,
    /// En-passant target square (where a capturing pawn would land).
    pub ep_square: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    pub stm: Color,

    /// Main Zobrist key plus the sub-keys consumed by the correction
    /// histories.
    pub key: u64,
    pub pawn_key: u64,
    pub non_pawn_key: [u64; 2],
    pub minor_key: u64,
    pub major_key: u64,

    /// All squares attacked by the side not to move.
    pub threats: Bitboard,
    /// Opponent pieces currently giving check.
    pub checkers: Bitboard,

    pub castling: CastlingInfo,
}

impl Position {
    pub(crate) fn empty() -> Position {
        Position {
            piece_bb: [0; 6],
            color_bb: [0; 2],
            king_squares: [Square(0); 2],
            castling_rights: 0,
            ep_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            stm: Color::White,
            key: 0,
            pawn_key: 0,
            non_pawn_key: [0; 2],
            minor_key: 0,
            major_key: 0,
            threats: 0,
            checkers: 0,
            castling: CastlingInfo::default(),
        }
    }

    pub fn startpos() -> Position {
        fen::parse(fen::STARTPOS).expect("startpos FEN is valid")
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.color_bb[0] | self.color_bb[1]
    }

    #[inline(always)]
    pub fn color_bb(&self, c: Color) -> Bitboard {
        self.color_bb[c.idx()]
    }

    #[inline(always)]
    pub fn piece_bb(&self, pt: PieceType) -> Bitboard {
        self.piece_bb[pt.idx()]
    }

    /// All pieces of one color and type.
    #[inline(always)]
    pub fn pieces(&self, c: Color, pt: PieceType) -> Bitboard {
        self.color_bb[c.idx()] & self.piece_bb[pt.idx()]
    }

    /// All pieces of one color and either of two types.
    #[inline(always)]
    pub fn pieces2(&self, c: Color, pt1: PieceType, pt2: PieceType) -> Bitboard {
        self.color_bb[c.idx()] & (self.piece_bb[pt1.idx()] | self.piece_bb[pt2.idx()])
    }

    #[inline(always)]
    pub fn king_sq(&self, c: Color) -> Square {
        self.king_squares[c.idx()]
    }

    pub fn piece_type_on(&self, sq: Square) -> Option<PieceType> {
        let b = bb(sq);
        PieceType::ALL
            .into_iter()
            .find(|pt| self.piece_bb[pt.idx()] & b != 0)
    }

    pub fn color_on(&self, sq: Square) -> Option<Color> {
        let b = bb(sq);
        if self.color_bb[Color::White.idx()] & b != 0 {
            Some(Color::White)
        } else if self.color_bb[Color::Black.idx()] & b != 0 {
            Some(Color::Black)
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn has_castling_right(&self, c: Color, kingside: bool) -> bool {
        self.castling_rights & castling::right_mask(c, kingside) != 0
    }

    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.checkers != 0
    }

    /// Castling aside, a move is a capture if it is en passant or lands
    /// on an opponent piece.
    #[inline(always)]
    pub fn is_capture(&self, m: Move) -> bool {
        debug_assert!(!m.is_null());
        m.is_en_passant()
            || (!m.is_castling() && self.color_bb[(!self.stm).idx()] & bb(m.to()) != 0)
    }

    /// Type of the piece a move captures; en passant always captures a
    /// pawn, castling never captures.
    pub fn captured_piece_type(&self, m: Move) -> Option<PieceType> {
        debug_assert!(!m.is_null());
        if m.is_en_passant() {
            Some(PieceType::Pawn)
        } else if m.is_castling() {
            None
        } else {
            self.piece_type_on(m.to())
        }
    }

    /// All pieces of both colors attacking `sq` under the given blocker
    /// set.
    pub fn attackers_to(&self, sq: Square, occ: Bitboard) -> Bitboard {
        attacks::pawn_attacks(Color::White, sq) & self.pieces(Color::Black, PieceType::Pawn)
            | attacks::pawn_attacks(Color::Black, sq) & self.pieces(Color::White, PieceType::Pawn)
            | attacks::knight_attacks(sq) & self.piece_bb[PieceType::Knight.idx()]
            | attacks::bishop_attacks(sq, occ)
                & (self.piece_bb[PieceType::Bishop.idx()] | self.piece_bb[PieceType::Queen.idx()])
            | attacks::rook_attacks(sq, occ)
                & (self.piece_bb[PieceType::Rook.idx()] | self.piece_bb[PieceType::Queen.idx()])
            | attacks::king_attacks(sq) & self.piece_bb[PieceType::King.idx()]
    }

    /// Opponent pieces attacking our king.
    pub fn compute_checkers(&self) -> Bitboard {
        self.attackers_to(self.king_sq(self.stm), self.occupied()) & self.color_bb[(!self.stm).idx()]
    }

    /// Side `c` still has something other than pawns and the king.
    pub fn has_non_pawn_material(&self, c: Color) -> bool {
        self.color_bb[c.idx()]
            & !self.piece_bb[PieceType::Pawn.idx()]
            & !self.piece_bb[PieceType::King.idx()]
            != 0
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Bare kings, or king + single minor vs king.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.piece_bb[PieceType::Pawn.idx()]
            | self.piece_bb[PieceType::Rook.idx()]
            | self.piece_bb[PieceType::Queen.idx()];
        heavy == 0
            && !more_than_one(
                self.piece_bb[PieceType::Knight.idx()] | self.piece_bb[PieceType::Bishop.idx()],
            )
    }

    pub(crate) fn set_piece(&mut self, c: Color, pt: PieceType, sq: Square) {
        debug_assert!(self.occupied() & bb(sq) == 0);
        self.piece_bb[pt.idx()] |= bb(sq);
        self.color_bb[c.idx()] |= bb(sq);
    }

    pub(crate) fn set_king_squares(&mut self) {
        self.king_squares[0] = crate::types::lsb(self.pieces(Color::White, PieceType::King));
        self.king_squares[1] = crate::types::lsb(self.pieces(Color::Black, PieceType::King));
    }

    pub(crate) fn set_king_sq(&mut self, c: Color, sq: Square) {
        self.king_squares[c.idx()] = sq;
    }

    /// Toggle a piece on `sq`, keeping the main key and every sub-key in
    /// sync. The single choke point for all incremental hash updates.
    #[inline]
    pub(crate) fn toggle(&mut self, c: Color, pt: PieceType, sq: Square) {
        self.piece_bb[pt.idx()] ^= bb(sq);
        self.color_bb[c.idx()] ^= bb(sq);

        let k = zobrist::piece_key(c, pt, sq);
        self.key ^= k;
        match pt {
            PieceType::Pawn => self.pawn_key ^= k,
            PieceType::Knight | PieceType::Bishop => {
                self.non_pawn_key[c.idx()] ^= k;
                self.minor_key ^= k;
            }
            PieceType::Rook | PieceType::Queen => {
                self.non_pawn_key[c.idx()] ^= k;
                self.major_key ^= k;
            }
            PieceType::King => {
                self.non_pawn_key[c.idx()] ^= k;
                self.minor_key ^= k;
                self.major_key ^= k;
            }
        }
    }

    /// Recompute every hash key from scratch. Used after FEN parsing and
    /// by the hash-consistency tests.
    pub fn recompute_keys(&mut self) {
        self.key = 0;
        self.pawn_key = 0;
        self.non_pawn_key = [0; 2];
        self.minor_key = 0;
        self.major_key = 0;

        for c in Color::BOTH {
            for pt in PieceType::ALL {
                for sq in crate::types::BitIter(self.pieces(c, pt)) {
                    let k = zobrist::piece_key(c, pt, sq);
                    self.key ^= k;
                    match pt {
                        PieceType::Pawn => self.pawn_key ^= k,
                        PieceType::Knight | PieceType::Bishop => {
                            self.non_pawn_key[c.idx()] ^= k;
                            self.minor_key ^= k;
                        }
                        PieceType::Rook | PieceType::Queen => {
                            self.non_pawn_key[c.idx()] ^= k;
                            self.major_key ^= k;
                        }
                        PieceType::King => {
                            self.non_pawn_key[c.idx()] ^= k;
                            self.minor_key ^= k;
                            self.major_key ^= k;
                        }
                    }
                }
            }
        }

        self.key ^= zobrist::castling_key(self.castling_rights);
        if let Some(ep) = self.ep_square {
            self.key ^= zobrist::ep_key(ep);
        }
        if self.stm == Color::Black {
            self.key ^= zobrist::side_key();
        }
    }
}
