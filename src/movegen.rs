//! Staged pseudo-legal move generation.
//!
//! Moves are generated in stages so the search can try captures before
//! quiets without paying for a full list. While in check, generation is
//! restricted to the check mask (capture the checker or block its ray);
//! only king moves escape the mask. Double check reduces the mask to
//! nothing, leaving king moves alone.
//!
//! Generation is pseudo-legal: pins and king safety are settled by
//! `Position::is_legal`, which has a cheap fast path for pieces that
//! cannot be pinned.

use crate::board::{attacks, castling, Position};
use crate::types::{
    bb, more_than_one, BitIter, Bitboard, Color, Move, MoveFlag, PieceType, Square, FULL_BB,
    MAX_MOVES, RANK_1, RANK_3, RANK_6, RANK_8,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenType {
    /// Captures, en passant and every promotion.
    Captures,
    /// Non-promotion quiet moves, castling included.
    Quiets,
    /// Captures restricted to the check mask.
    CaptureEvasions,
    /// Quiets restricted to the check mask.
    QuietEvasions,
}

/// Fixed-capacity move list. A legal position never exceeds 218 moves,
/// so the array never overflows for input reachable through the FEN
/// boundary.
#[derive(Clone, Copy)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    #[inline(always)]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    /// Swap the move at `i` to the front of the unsorted tail at `start`.
    #[inline(always)]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.moves.swap(a, b);
    }
}

impl Default for MoveList {
    fn default() -> Self {
        MoveList::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline(always)]
    fn index(&self, i: usize) -> &Move {
        debug_assert!(i < self.len);
        &self.moves[i]
    }
}

/// Append all pseudo-legal moves of the given stage to `list`.
pub fn generate(p: &Position, gt: GenType, list: &mut MoveList) {
    let evasions = matches!(gt, GenType::CaptureEvasions | GenType::QuietEvasions);
    debug_assert_eq!(evasions, p.in_check());

    let captures = matches!(gt, GenType::Captures | GenType::CaptureEvasions);

    let us = p.stm;
    let us_bb = p.color_bb(us);
    let them_bb = p.color_bb(!us);
    let occ = p.occupied();
    let ksq = p.king_sq(us);

    // everything except the king must land inside the check mask
    let check_mask = if !evasions {
        FULL_BB
    } else if more_than_one(p.checkers) {
        0
    } else {
        attacks::between(ksq, crate::types::lsb(p.checkers)) | p.checkers
    };

    // king moves ignore the mask; threatened squares are pre-filtered
    // and x-rays through the king are left to the legality check
    let king_targets =
        attacks::king_attacks(ksq) & !us_bb & !p.threats & if captures { them_bb } else { !occ };
    for to in BitIter(king_targets) {
        list.push(Move::new(ksq, to, MoveFlag::Normal));
    }

    if check_mask != 0 {
        let targets = if captures { them_bb } else { !occ } & check_mask;

        generate_pawn_moves(p, gt, check_mask, list);

        for from in BitIter(p.pieces(us, PieceType::Knight)) {
            for to in BitIter(attacks::knight_attacks(from) & targets) {
                list.push(Move::new(from, to, MoveFlag::Normal));
            }
        }
        for from in BitIter(p.pieces2(us, PieceType::Bishop, PieceType::Queen)) {
            for to in BitIter(attacks::bishop_attacks(from, occ) & targets) {
                list.push(Move::new(from, to, MoveFlag::Normal));
            }
        }
        for from in BitIter(p.pieces2(us, PieceType::Rook, PieceType::Queen)) {
            for to in BitIter(attacks::rook_attacks(from, occ) & targets) {
                list.push(Move::new(from, to, MoveFlag::Normal));
            }
        }
    }

    if gt == GenType::Quiets {
        generate_castling(p, list);
    }
}

fn generate_pawn_moves(p: &Position, gt: GenType, check_mask: Bitboard, list: &mut MoveList) {
    let us = p.stm;
    let occ = p.occupied();
    let them_bb = p.color_bb(!us);
    let empty = !occ;

    let pawns = p.pieces(us, PieceType::Pawn);
    let seventh = if us == Color::White { RANK_8 >> 8 } else { RANK_1 << 8 };
    let promo_pawns = pawns & seventh;
    let quiet_pawns = pawns & !seventh;

    let up: i8 = if us == Color::White { 8 } else { -8 };
    let shift = |b: Bitboard, d: i8| -> Bitboard {
        if d >= 0 {
            b << d
        } else {
            b >> -d
        }
    };

    if matches!(gt, GenType::Quiets | GenType::QuietEvasions) {
        // single and double pushes; the double-push gate rank is relative
        let single = shift(quiet_pawns, up) & empty;
        let third = if us == Color::White { RANK_3 } else { RANK_6 };
        let double = shift(single & third, up) & empty & check_mask;
        for to in BitIter(single & check_mask) {
            list.push(Move::new(to.offset(-up), to, MoveFlag::Normal));
        }
        for to in BitIter(double) {
            list.push(Move::new(to.offset(-2 * up), to, MoveFlag::Normal));
        }
        return;
    }

    // captures, left then right from white's point of view
    let left = shift(quiet_pawns & !crate::types::FILE_A, up - 1) & them_bb & check_mask;
    let right = shift(quiet_pawns & !crate::types::FILE_H, up + 1) & them_bb & check_mask;
    for to in BitIter(left) {
        list.push(Move::new(to.offset(-(up - 1)), to, MoveFlag::Normal));
    }
    for to in BitIter(right) {
        list.push(Move::new(to.offset(-(up + 1)), to, MoveFlag::Normal));
    }

    if promo_pawns != 0 {
        let push = shift(promo_pawns, up) & empty & check_mask;
        let pleft = shift(promo_pawns & !crate::types::FILE_A, up - 1) & them_bb & check_mask;
        let pright = shift(promo_pawns & !crate::types::FILE_H, up + 1) & them_bb & check_mask;
        for (b, d) in [(push, up), (pleft, up - 1), (pright, up + 1)] {
            for to in BitIter(b) {
                let from = to.offset(-d);
                for promo in [
                    PieceType::Queen,
                    PieceType::Knight,
                    PieceType::Rook,
                    PieceType::Bishop,
                ] {
                    list.push(Move::promotion(from, to, promo));
                }
            }
        }
    }

    if let Some(ep) = p.ep_square {
        // the mask is deliberately skipped: an ep capture can resolve a
        // check by removing the checking pawn, is_legal settles it
        for from in BitIter(attacks::pawn_attacks(!us, ep) & quiet_pawns) {
            list.push(Move::new(from, ep, MoveFlag::EnPassant));
        }
    }
}

fn generate_castling(p: &Position, list: &mut MoveList) {
    debug_assert!(!p.in_check());
    let us = p.stm;
    for kingside in [true, false] {
        if !p.has_castling_right(us, kingside) {
            continue;
        }
        let idx = castling::castle_idx(us, kingside);
        if p.occupied() & p.castling.path[idx] == 0 {
            list.push(Move::new(
                p.castling.king_start[us.idx()],
                p.castling.rook_start[idx],
                MoveFlag::Castling,
            ));
        }
    }
}

/// All strictly legal moves. Perft and the root of the search use this;
/// interior nodes stage generation through `MovePicker` instead.
pub fn generate_legal(p: &Position) -> MoveList {
    let mut pseudo = MoveList::new();
    if p.in_check() {
        generate(p, GenType::CaptureEvasions, &mut pseudo);
        generate(p, GenType::QuietEvasions, &mut pseudo);
    } else {
        generate(p, GenType::Captures, &mut pseudo);
        generate(p, GenType::Quiets, &mut pseudo);
    }

    let mut legal = MoveList::new();
    for &m in pseudo.as_slice() {
        if p.is_legal(m) {
            legal.push(m);
        }
    }
    legal
}

/// Parse a move in UCI long algebraic notation against a position.
/// Standard castling notation (e1g1) is converted to the internal
/// king-takes-rook encoding; king-takes-rook input is accepted as is.
/// Returns `None` when the token does not describe a legal move.
pub fn move_from_uci(p: &Position, s: &str) -> Option<Move> {
    if s.len() < 4 || s.len() > 5 {
        return None;
    }
    let from = Square::parse(&s[0..2])?;
    let mut to = Square::parse(&s[2..4])?;

    let m = if let Some(c) = s.chars().nth(4) {
        let promo = match c {
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            _ => return None,
        };
        Move::promotion(from, to, promo)
    } else if p.piece_type_on(from) == Some(PieceType::King) {
        if p.pieces(p.stm, PieceType::Rook) & bb(to) != 0 {
            Move::new(from, to, MoveFlag::Castling)
        } else if from.file().abs_diff(to.file()) > 1 {
            let kingside = to > from;
            to = p.castling.rook_start[castling::castle_idx(p.stm, kingside)];
            Move::new(from, to, MoveFlag::Castling)
        } else {
            Move::new(from, to, MoveFlag::Normal)
        }
    } else if p.piece_type_on(from) == Some(PieceType::Pawn)
        && p.ep_square == Some(to)
        && from.file() != to.file()
    {
        Move::new(from, to, MoveFlag::EnPassant)
    } else {
        Move::new(from, to, MoveFlag::Normal)
    };

    (p.is_pseudo_legal(m) && p.is_legal(m)).then_some(m)
}

/// Render a move in UCI notation. Castling is printed in standard
/// notation (king to its destination) since the rook encoding is
/// internal only.
pub fn move_to_uci(m: Move) -> String {
    if m.is_null() {
        return "0000".into();
    }
    if m.is_castling() {
        let kingside = m.from() < m.to();
        let rank = m.from().rank();
        let dest = Square::new(if kingside { 6 } else { 2 }, rank);
        return format!("{}{}", m.from(), dest);
    }
    let mut s = format!("{}{}", m.from(), m.to());
    if m.is_promotion() {
        s.push(match m.promo_type() {
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            _ => 'q',
        });
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(f: &str) -> Position {
        Position::from_fen(f).unwrap()
    }

    #[test]
    fn startpos_has_twenty_moves() {
        assert_eq!(generate_legal(&Position::startpos()).len(), 20);
    }

    #[test]
    fn kiwipete_has_48_moves() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(generate_legal(&p).len(), 48);
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // rook on e8 and knight on d3 both give check
        let p = pos("4r2k/8/8/8/8/3n4/8/4K3 w - - 0 1");
        let legal = generate_legal(&p);
        assert!(!legal.is_empty());
        for m in legal.as_slice() {
            assert_eq!(p.piece_type_on(m.from()), Some(PieceType::King));
        }
    }

    #[test]
    fn evasions_stay_inside_check_mask() {
        // rook gives check along the e-file; every reply blocks,
        // captures the rook or moves the king
        let p = pos("4r2k/8/8/8/8/8/3B4/4K3 w - - 0 1");
        let legal = generate_legal(&p);
        for m in legal.as_slice() {
            let mut child = p;
            child.apply_move(*m);
            assert_eq!(
                child.attackers_to(child.king_sq(!child.stm), child.occupied())
                    & child.color_bb(child.stm),
                0
            );
        }
        // the bishop can block on e3
        assert!(legal.as_slice().iter().any(|m| m.to() == Square::parse("e3").unwrap()));
    }

    #[test]
    fn uci_roundtrip_and_castling_notation() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let m = move_from_uci(&p, "e1g1").unwrap();
        assert!(m.is_castling());
        assert_eq!(m.to(), Square::parse("h1").unwrap());
        assert_eq!(move_to_uci(m), "e1g1");

        // king takes rook spelling is accepted too
        assert_eq!(move_from_uci(&p, "e1h1"), Some(m));

        let quiet = move_from_uci(&p, "e2d3").unwrap();
        assert_eq!(move_to_uci(quiet), "e2d3");
        assert!(move_from_uci(&p, "e2e5").is_none());
    }

    #[test]
    fn promotions_generated_in_capture_stage() {
        let p = pos("3n4/4P3/8/8/8/8/8/k3K3 w - - 0 1");
        let mut list = MoveList::new();
        generate(&p, GenType::Captures, &mut list);
        let promos = list
            .as_slice()
            .iter()
            .filter(|m| m.is_promotion())
            .count();
        // push to e8 and capture on d8, four pieces each
        assert_eq!(promos, 8);
    }
}
