//! Move application and legality checking.

use crate::types::{bb, more_than_one, Bitboard, Color, Move, PieceType, Square};

use super::attacks;
use super::castling;
use super::zobrist;
use super::Position;

impl Position {
    /// Apply `m` to this position. The move must be legal; this is a
    /// caller contract, checked in debug builds only.
    ///
    /// Returns the moved piece type and the captured piece type (if any)
    /// for the search stack's history and NNUE bookkeeping.
    pub fn apply_move(&mut self, m: Move) -> (PieceType, Option<PieceType>) {
        debug_assert!(!m.is_null());
        debug_assert!(self.is_pseudo_legal(m) && self.is_legal(m), "illegal move applied");

        let us = self.stm;
        let them = !us;
        let from = m.from();
        let to = m.to();

        let moved = self
            .piece_type_on(from)
            .expect("apply_move: no piece on origin square");
        let captured = self.captured_piece_type(m);

        // hash out the state-dependent keys; they are re-added below
        self.key ^= zobrist::castling_key(self.castling_rights);
        if let Some(ep) = self.ep_square.take() {
            self.key ^= zobrist::ep_key(ep);
        }

        self.halfmove_clock += 1;

        if m.is_castling() {
            // encoded as king takes own rook
            let kingside = from < to;
            let k_dest = castling::king_destination(us, kingside);
            let r_dest = castling::rook_destination(us, kingside);

            self.toggle(us, PieceType::Rook, to);
            self.toggle(us, PieceType::King, from);
            self.toggle(us, PieceType::King, k_dest);
            self.toggle(us, PieceType::Rook, r_dest);
            self.set_king_sq(us, k_dest);
        } else {
            if let Some(victim) = captured {
                let victim_sq = if m.is_en_passant() {
                    if us == Color::White {
                        to.offset(-8)
                    } else {
                        to.offset(8)
                    }
                } else {
                    to
                };
                self.toggle(them, victim, victim_sq);
                self.halfmove_clock = 0;
            }

            self.toggle(us, moved, from);
            self.toggle(us, moved, to);

            if moved == PieceType::Pawn {
                self.halfmove_clock = 0;

                if (from.0 as i32 - to.0 as i32).abs() == 16 {
                    // only record the target when an enemy pawn could
                    // actually take, matching the FEN parser's filter
                    let ep = Square((from.0 + to.0) / 2);
                    if attacks::pawn_attacks(us, ep) & self.pieces(them, PieceType::Pawn) != 0 {
                        self.ep_square = Some(ep);
                        self.key ^= zobrist::ep_key(ep);
                    }
                }

                if m.is_promotion() {
                    self.toggle(us, PieceType::Pawn, to);
                    self.toggle(us, m.promo_type(), to);
                }
            }

            if moved == PieceType::King {
                self.set_king_sq(us, to);
            }
        }

        self.castling_rights &=
            self.castling.modifier[from.idx()] & self.castling.modifier[to.idx()];
        self.key ^= zobrist::castling_key(self.castling_rights);

        self.stm = them;
        self.key ^= zobrist::side_key();
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.threats = self.compute_threats();
        self.checkers = self.compute_checkers();

        (moved, captured)
    }

    /// Pass the turn without moving. Only meaningful when not in check.
    pub fn apply_null_move(&mut self) {
        debug_assert!(!self.in_check());

        if let Some(ep) = self.ep_square.take() {
            self.key ^= zobrist::ep_key(ep);
        }
        self.halfmove_clock += 1;
        self.stm = !self.stm;
        self.key ^= zobrist::side_key();

        self.threats = self.compute_threats();
        self.checkers = 0;
    }

    /// All squares attacked by the side not to move, over the full
    /// occupancy.
    pub fn compute_threats(&self) -> Bitboard {
        let them = !self.stm;
        let occ = self.occupied();

        let mut threats =
            attacks::pawn_attacks_bb(them, self.pieces(them, PieceType::Pawn));

        for sq in crate::types::BitIter(self.pieces(them, PieceType::Knight)) {
            threats |= attacks::knight_attacks(sq);
        }
        for sq in crate::types::BitIter(self.pieces2(them, PieceType::Bishop, PieceType::Queen)) {
            threats |= attacks::bishop_attacks(sq, occ);
        }
        for sq in crate::types::BitIter(self.pieces2(them, PieceType::Rook, PieceType::Queen)) {
            threats |= attacks::rook_attacks(sq, occ);
        }
        threats | attacks::king_attacks(self.king_sq(them))
    }

    /// Could a piece on `sq` be pinned against our king? True when the
    /// squares strictly between are empty and the two are aligned.
    #[inline]
    fn in_kings_slider_vision(&self, sq: Square) -> bool {
        let ksq = self.king_sq(self.stm);
        attacks::line(ksq, sq) != 0 && attacks::between(ksq, sq) & self.occupied() == 0
    }

    /// Full legality check. Assumes `m` already passed a pseudo-legality
    /// check (either generation or `is_pseudo_legal`).
    ///
    /// Castling walks the king's path under the post-move blocker set;
    /// en passant re-tests the king with both pawns removed. Any other
    /// move only needs the expensive attacker test when the king moves
    /// or the origin lies on a cleared ray through the king, because
    /// generation already restricts moves to the check mask.
    pub fn is_legal(&self, m: Move) -> bool {
        debug_assert!(!m.is_null());

        let us = self.stm;
        let them_bb = self.color_bb(!us);
        let from = m.from();
        let to = m.to();

        if m.is_castling() {
            let kingside = from < to;
            let idx = castling::castle_idx(us, kingside);
            if !self.has_castling_right(us, kingside)
                || self.occupied() & self.castling.path[idx] != 0
                || self.in_check()
            {
                return false;
            }

            let k_dest = castling::king_destination(us, kingside);
            let r_dest = castling::rook_destination(us, kingside);
            // king and rook lifted, rook placed on its destination
            let block = (self.occupied() ^ bb(from) ^ bb(to)) | bb(r_dest);

            // every square the king crosses, destination included, must
            // be safe
            let mut path = attacks::between(from, k_dest) | bb(k_dest);
            while path != 0 {
                let sq = crate::types::pop_lsb(&mut path);
                if self.attackers_to(sq, block) & them_bb != 0 {
                    return false;
                }
            }
            return true;
        }

        let moved_king = self.piece_type_on(from) == Some(PieceType::King);
        let ksq = if moved_king { to } else { self.king_sq(us) };

        if m.is_en_passant() {
            let victim = if us == Color::White {
                to.offset(-8)
            } else {
                to.offset(8)
            };
            let block = ((self.occupied() ^ bb(from)) | bb(to)) ^ bb(victim);
            return self.attackers_to(ksq, block) & them_bb & !bb(victim) == 0;
        }

        if !moved_king && !self.in_kings_slider_vision(from) {
            return true;
        }

        let block = (self.occupied() ^ bb(from)) | bb(to);
        self.attackers_to(ksq, block) & them_bb & !bb(to) == 0
    }

    /// Cheap structural check for moves pulled from the transposition
    /// table or the killer slots, which may be stale for this position.
    /// A move passing this check is safe to feed into `is_legal`.
    pub fn is_pseudo_legal(&self, m: Move) -> bool {
        if m.is_null() {
            return false;
        }

        let us = self.stm;
        let from = m.from();
        let to = m.to();
        let occ = self.occupied();

        let pt = match (self.piece_type_on(from), self.color_on(from)) {
            (Some(pt), Some(c)) if c == us => pt,
            _ => return false,
        };

        if m.is_castling() {
            if pt != PieceType::King || self.in_check() {
                return false;
            }
            let kingside = from < to;
            let idx = castling::castle_idx(us, kingside);
            return self.has_castling_right(us, kingside)
                && from == self.castling.king_start[us.idx()]
                && to == self.castling.rook_start[idx]
                && occ & self.castling.path[idx] == 0;
        }

        // never capture our own pieces
        if self.color_bb(us) & bb(to) != 0 {
            return false;
        }

        if m.is_promotion() && pt != PieceType::Pawn {
            return false;
        }

        match pt {
            PieceType::Pawn => {
                let push = if us == Color::White { 8i32 } else { -8 };
                let delta = to.0 as i32 - from.0 as i32;
                let on_promo_rank = to.rank() == if us == Color::White { 7 } else { 0 };
                if m.is_promotion() != on_promo_rank {
                    return false;
                }

                if m.is_en_passant() {
                    if self.ep_square != Some(to) {
                        return false;
                    }
                    if attacks::pawn_attacks(us, from) & bb(to) == 0 {
                        return false;
                    }
                } else if attacks::pawn_attacks(us, from) & bb(to) != 0 {
                    // capture: needs an enemy piece on the target
                    if self.color_bb(!us) & bb(to) == 0 {
                        return false;
                    }
                } else if delta == push {
                    if occ & bb(to) != 0 {
                        return false;
                    }
                } else if delta == 2 * push {
                    let start_rank = if us == Color::White { 1 } else { 6 };
                    let mid = Square((from.0 + to.0) / 2);
                    if from.rank() != start_rank || occ & (bb(mid) | bb(to)) != 0 {
                        return false;
                    }
                } else {
                    return false;
                }
            }
            _ => {
                if m.flag() != crate::types::MoveFlag::Normal {
                    return false;
                }
                if attacks::piece_attacks(pt, from, occ) & bb(to) == 0 {
                    return false;
                }
            }
        }

        // while in check, non-king moves must resolve the check the same
        // way generation would
        if self.in_check() && pt != PieceType::King {
            if more_than_one(self.checkers) {
                return false;
            }
            let checker = crate::types::lsb(self.checkers);
            let mask = attacks::between(self.king_sq(us), checker) | self.checkers;
            let resolves = mask & bb(to) != 0
                || (m.is_en_passant() && {
                    let victim = if us == Color::White {
                        to.offset(-8)
                    } else {
                        to.offset(8)
                    };
                    victim == checker
                });
            if !resolves {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen;

    fn pos(f: &str) -> Position {
        Position::from_fen(f).unwrap()
    }

    #[test]
    fn apply_move_updates_hash_incrementally() {
        let mut p = Position::startpos();
        for mv in ["e2e4", "c7c5", "g1f3", "d7d6", "f1b5", "c8d7", "e1g1"] {
            let m = crate::movegen::move_from_uci(&p, mv).unwrap();
            p.apply_move(m);
            let mut fresh = p;
            fresh.recompute_keys();
            assert_eq!(p.key, fresh.key, "after {mv}");
            assert_eq!(p.pawn_key, fresh.pawn_key, "after {mv}");
            assert_eq!(p.minor_key, fresh.minor_key, "after {mv}");
            assert_eq!(p.major_key, fresh.major_key, "after {mv}");
            assert_eq!(p.non_pawn_key, fresh.non_pawn_key, "after {mv}");
        }
    }

    #[test]
    fn copy_make_leaves_parent_untouched() {
        let parent = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let before = parent;
        for m in crate::movegen::generate_legal(&parent).as_slice() {
            let mut child = parent;
            child.apply_move(*m);
            assert_eq!(parent, before);
        }
    }

    #[test]
    fn null_move_flips_side_and_hash() {
        let mut p = Position::startpos();
        let key = p.key;
        p.apply_null_move();
        assert_eq!(p.stm, Color::Black);
        assert_ne!(p.key, key);
        let mut fresh = p;
        fresh.recompute_keys();
        assert_eq!(p.key, fresh.key);
    }

    #[test]
    fn en_passant_pin_is_illegal() {
        // taking en passant would clear the fifth rank and expose the
        // white king to the rook on h5
        let p = pos("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1");
        let m = Move::new(
            Square::parse("e5").unwrap(),
            Square::parse("d6").unwrap(),
            crate::types::MoveFlag::EnPassant,
        );
        assert!(p.is_pseudo_legal(m));
        assert!(!p.is_legal(m));
    }

    #[test]
    fn castling_through_check_is_illegal() {
        // black bishop covers f1 from b5 without giving check
        let p = pos("4k3/8/8/1b6/8/8/8/R3K2R w KQ - 0 1");
        let ks = Move::new(Square::parse("e1").unwrap(), Square::parse("h1").unwrap(), crate::types::MoveFlag::Castling);
        assert!(p.is_pseudo_legal(ks));
        assert!(!p.is_legal(ks));
    }
}
