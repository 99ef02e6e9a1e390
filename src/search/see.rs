//! Static exchange evaluation.
//!
//! Answers "does this capture sequence win at least `threshold`
//! centipawns" without searching, by playing out the exchange on the
//! target square with the least valuable attacker first and revealing
//! sliders behind each capturer.

use crate::board::attacks;
use crate::board::Position;
use crate::types::{bb, lsb, Bitboard, Move, PieceType};

/// Exchange values, independent of the evaluation network. The king's
/// value is never added; running out of defenders while the king would
/// have to recapture ends the exchange instead.
pub const SEE_VALUES: [i32; 6] = [100, 450, 450, 650, 1250, 0];

#[inline(always)]
pub fn value(pt: PieceType) -> i32 {
    SEE_VALUES[pt.idx()]
}

/// True when the exchange started by `m` gains at least `threshold`.
/// Castling never loses material; en passant starts a pawn down.
pub fn see(p: &Position, m: Move, threshold: i32) -> bool {
    if m.is_castling() {
        return threshold <= 0;
    }

    let from = m.from();
    let to = m.to();

    let captured = if m.is_en_passant() {
        value(PieceType::Pawn)
    } else {
        p.piece_type_on(to).map_or(0, value)
    };

    // the capture alone fails the threshold, nothing to play out
    let mut balance = captured - threshold;
    if balance < 0 {
        return false;
    }

    let moved = match p.piece_type_on(from) {
        Some(pt) => pt,
        None => return false,
    };
    let next_victim = if m.is_promotion() { m.promo_type() } else { moved };

    // worst case: our capturer is taken back for free
    balance -= value(next_victim);
    if balance >= 0 {
        return true;
    }

    let mut occ = (p.occupied() ^ bb(from)) | bb(to);
    if m.is_en_passant() {
        let victim = if p.stm == crate::types::Color::White {
            to.offset(-8)
        } else {
            to.offset(8)
        };
        occ ^= bb(victim);
    }

    let bishops = p.piece_bb(PieceType::Bishop) | p.piece_bb(PieceType::Queen);
    let rooks = p.piece_bb(PieceType::Rook) | p.piece_bb(PieceType::Queen);

    let mut attackers = p.attackers_to(to, occ) & occ;
    let mut side = !p.stm;

    loop {
        let own = attackers & p.color_bb(side);
        if own == 0 {
            break;
        }

        // least valuable attacker first
        let mut attacker = PieceType::King;
        let mut attacker_bb: Bitboard = 0;
        for pt in PieceType::ALL {
            let subset = own & p.piece_bb(pt);
            if subset != 0 {
                attacker = pt;
                attacker_bb = bb(lsb(subset));
                break;
            }
        }

        occ ^= attacker_bb;
        // reveal sliders that were lined up behind the capturer
        if matches!(attacker, PieceType::Pawn | PieceType::Bishop | PieceType::Queen) {
            attackers |= attacks::bishop_attacks(to, occ) & bishops;
        }
        if matches!(attacker, PieceType::Rook | PieceType::Queen) {
            attackers |= attacks::rook_attacks(to, occ) & rooks;
        }
        attackers &= occ;

        // negamax over the running balance: each capture flips the sign
        // and puts the capturer on the square as the next victim
        balance = -balance - 1 - value(attacker);
        side = !side;

        if balance >= 0 {
            // a king "winning" the exchange onto a still-defended
            // square actually loses it, hand the result back
            if attacker == PieceType::King && attackers & p.color_bb(side) != 0 {
                side = !side;
            }
            break;
        }
    }

    // whoever is to move after the loop failed to continue profitably
    side != p.stm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::move_from_uci;

    fn check(fen: &str, mv: &str, threshold: i32) -> bool {
        let p = Position::from_fen(fen).unwrap();
        let m = move_from_uci(&p, mv).unwrap();
        see(&p, m, threshold)
    }

    #[test]
    fn free_pawn_is_winning() {
        assert!(check("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5", 0));
        assert!(check("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5", 100));
        assert!(!check("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5", 101));
    }

    #[test]
    fn defended_pawn_loses_a_knight() {
        // NxP, PxN: nets a pawn, loses a knight
        assert!(!check("4k3/2p5/3p4/8/4N3/8/8/4K3 w - - 0 1", "e4d6", 0));
        assert!(check("4k3/2p5/3p4/8/4N3/8/8/4K3 w - - 0 1", "e4d6", -400));
    }

    #[test]
    fn xray_recapture_counts() {
        // RxR is met by the rook stacked behind on the file, and our own
        // back rook recaptures in turn
        assert!(check("2r1k3/2r5/8/8/8/8/2R5/2R1K3 w - - 0 1", "c2c7", 0));
        // with a queen in front the full sequence QxR RxQ RxR nets two
        // rooks for the queen, barely positive but short of 100
        assert!(check("2r1k3/2r5/8/8/8/8/2Q5/2R1K3 w - - 0 1", "c2c7", 0));
        assert!(!check("2r1k3/2r5/8/8/8/8/2Q5/2R1K3 w - - 0 1", "c2c7", 100));
    }

    #[test]
    fn quiet_move_into_defended_square() {
        // Nd5 hangs the knight to the c6 pawn
        assert!(!check("4k3/8/2p5/8/8/4N3/8/4K3 w - - 0 1", "e3d5", 0));
        assert!(check("4k3/8/2p5/8/8/4N3/8/4K3 w - - 0 1", "e3d5", -450));
    }

    #[test]
    fn king_recapture_ends_the_exchange() {
        // RxP is answered by KxR because nothing defends the rook
        let fen = "8/8/8/3k4/3p4/8/3R4/3K4 w - - 0 1";
        assert!(!check(fen, "d2d4", 0));
        assert!(check(fen, "d2d4", -600));
    }
}
