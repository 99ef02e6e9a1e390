//! History tables: bounded per-move statistics that drive move ordering
//! and the static-evaluation correction.
//!
//! Every counter uses the same decaying update, so hot moves saturate
//! instead of growing without bound and stale signal fades on its own.

use crate::board::Position;
use crate::types::{bb, Color, Move, PieceType, Square};

pub const HIST_MAX: i32 = 16_000;
const GRAVITY_DIV: i32 = 1024;

const CORR_SIZE: usize = 16_384;
const CORR_MAX_DELTA: i32 = HIST_MAX / 4;

/// `value += delta - value * |delta| / 1024`, clamped. Deltas larger
/// than the clamp range would overshoot, so they are clamped first.
#[inline]
fn gravity(slot: &mut i16, delta: i32) {
    let d = delta.clamp(-HIST_MAX, HIST_MAX);
    let v = *slot as i32;
    *slot = (v + d - v * d.abs() / GRAVITY_DIV).clamp(-HIST_MAX, HIST_MAX) as i16;
}

/// Bonus for a move that caused a fail-high, malus for the quiets tried
/// before it.
#[inline]
pub fn stat_bonus(depth: i32) -> i32 {
    (16 * depth * depth + 128 * depth.max(1)).min(1200)
}

/// Statistics for one follow-up move, addressed by the earlier move's
/// color, piece and destination.
type PieceTo = [[[i16; 64]; 6]; 2];

/// Identifies a played move for continuation-history purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRef {
    pub color: Color,
    pub piece: PieceType,
    pub to: Square,
}

pub struct History {
    /// Quiet-move butterfly table, split by whether the origin and
    /// destination squares stand attacked.
    butterfly: Box<[[[[i16; 4096]; 2]; 2]; 2]>,
    /// Follow-up statistics addressed by the move one or two plies back.
    continuation: Box<[[[PieceTo; 64]; 6]; 2]>,
    /// Capture ordering, split by whether the destination is defended.
    capture: Box<[[[[[i16; 64]; 6]; 6]; 2]; 2]>,

    corr_pawn: Box<[[i16; CORR_SIZE]; 2]>,
    corr_non_pawn: Box<[[[i16; CORR_SIZE]; 2]; 2]>,
    corr_minor: Box<[[i16; CORR_SIZE]; 2]>,
    corr_major: Box<[[i16; CORR_SIZE]; 2]>,
    corr_threats: Box<[[i16; CORR_SIZE]; 2]>,
    corr_prev_move: Box<[[[i16; 64]; 6]; 2]>,
}

/// Heap-allocate a zero-filled table without building it on the stack
/// first; the continuation table alone is over a megabyte.
fn zeroed<T>() -> Box<T> {
    // safety: only instantiated with plain integer arrays, for which
    // all-zero bytes are a valid value
    unsafe {
        let layout = std::alloc::Layout::new::<T>();
        let ptr = std::alloc::alloc_zeroed(layout) as *mut T;
        if ptr.is_null() {
            std::alloc::handle_alloc_error(layout);
        }
        Box::from_raw(ptr)
    }
}

impl History {
    pub fn new() -> History {
        History {
            butterfly: zeroed(),
            continuation: zeroed(),
            capture: zeroed(),
            corr_pawn: zeroed(),
            corr_non_pawn: zeroed(),
            corr_minor: zeroed(),
            corr_major: zeroed(),
            corr_threats: zeroed(),
            corr_prev_move: zeroed(),
        }
    }

    pub fn clear(&mut self) {
        *self = History::new();
    }

    #[inline]
    fn butterfly_slot(&mut self, p: &Position, m: Move) -> &mut i16 {
        let from_thr = usize::from(p.threats & bb(m.from()) != 0);
        let to_thr = usize::from(p.threats & bb(m.to()) != 0);
        &mut self.butterfly[p.stm.idx()][from_thr][to_thr][m.butterfly()]
    }

    pub fn quiet_score(&self, p: &Position, m: Move) -> i32 {
        let from_thr = usize::from(p.threats & bb(m.from()) != 0);
        let to_thr = usize::from(p.threats & bb(m.to()) != 0);
        self.butterfly[p.stm.idx()][from_thr][to_thr][m.butterfly()] as i32
    }

    pub fn continuation_score(&self, prior: Option<MoveRef>, current: MoveRef) -> i32 {
        match prior {
            Some(pr) => self.continuation[pr.color.idx()][pr.piece.idx()][pr.to.idx()]
                [current.color.idx()][current.piece.idx()][current.to.idx()]
                as i32,
            None => 0,
        }
    }

    pub fn capture_score(&self, p: &Position, m: Move, attacker: PieceType) -> i32 {
        let victim = p.captured_piece_type(m).unwrap_or(PieceType::Pawn);
        let to_thr = usize::from(p.threats & bb(m.to()) != 0);
        self.capture[to_thr][p.stm.idx()][attacker.idx()][victim.idx()][m.to().idx()] as i32
    }

    pub fn update_quiet(&mut self, p: &Position, m: Move, delta: i32) {
        gravity(self.butterfly_slot(p, m), delta);
    }

    pub fn update_continuation(&mut self, prior: Option<MoveRef>, current: MoveRef, delta: i32) {
        if let Some(pr) = prior {
            gravity(
                &mut self.continuation[pr.color.idx()][pr.piece.idx()][pr.to.idx()]
                    [current.color.idx()][current.piece.idx()][current.to.idx()],
                delta,
            );
        }
    }

    pub fn update_capture(&mut self, p: &Position, m: Move, attacker: PieceType, delta: i32) {
        let victim = p.captured_piece_type(m).unwrap_or(PieceType::Pawn);
        let to_thr = usize::from(p.threats & bb(m.to()) != 0);
        gravity(
            &mut self.capture[to_thr][p.stm.idx()][attacker.idx()][victim.idx()][m.to().idx()],
            delta,
        );
    }

    /// Correction applied to the raw static evaluation: each table votes
    /// with its running average of the search-score/eval gap for
    /// positions sharing the same structural key.
    pub fn correction(&self, p: &Position, prev: Option<MoveRef>) -> i32 {
        let us = p.stm.idx();
        let mut sum = 0i32;

        sum += self.corr_pawn[us][(p.pawn_key % CORR_SIZE as u64) as usize] as i32;
        for c in Color::BOTH {
            sum += self.corr_non_pawn[us][c.idx()]
                [(p.non_pawn_key[c.idx()] % CORR_SIZE as u64) as usize] as i32;
        }
        sum += self.corr_minor[us][(p.minor_key % CORR_SIZE as u64) as usize] as i32;
        sum += self.corr_major[us][(p.major_key % CORR_SIZE as u64) as usize] as i32;
        sum += self.corr_threats[us][(threats_key(p.threats) % CORR_SIZE as u64) as usize] as i32;
        if let Some(pr) = prev {
            sum += self.corr_prev_move[us][pr.piece.idx()][pr.to.idx()] as i32;
        }

        16 * sum / HIST_MAX
    }

    /// Fold the observed gap between the search result and the static
    /// evaluation back into every correction table.
    pub fn update_correction(
        &mut self,
        p: &Position,
        prev: Option<MoveRef>,
        diff: i32,
        depth: i32,
    ) {
        let delta = (diff * depth / 8).clamp(-CORR_MAX_DELTA, CORR_MAX_DELTA);
        let us = p.stm.idx();

        gravity(
            &mut self.corr_pawn[us][(p.pawn_key % CORR_SIZE as u64) as usize],
            delta,
        );
        for c in Color::BOTH {
            gravity(
                &mut self.corr_non_pawn[us][c.idx()]
                    [(p.non_pawn_key[c.idx()] % CORR_SIZE as u64) as usize],
                delta,
            );
        }
        gravity(
            &mut self.corr_minor[us][(p.minor_key % CORR_SIZE as u64) as usize],
            delta,
        );
        gravity(
            &mut self.corr_major[us][(p.major_key % CORR_SIZE as u64) as usize],
            delta,
        );
        gravity(
            &mut self.corr_threats[us][(threats_key(p.threats) % CORR_SIZE as u64) as usize],
            delta,
        );
        if let Some(pr) = prev {
            gravity(&mut self.corr_prev_move[us][pr.piece.idx()][pr.to.idx()], delta);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}

/// The threats map has no incremental zobrist key, a multiply-xorshift
/// mix of the raw bitboard spreads it over the table well enough.
#[inline]
fn threats_key(threats: u64) -> u64 {
    let mut x = threats.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x ^= x >> 29;
    x.wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_saturates() {
        let mut v: i16 = 0;
        for _ in 0..200 {
            gravity(&mut v, 1200);
        }
        let settled = v;
        gravity(&mut v, 1200);
        // near the fixed point further bonuses barely move the value
        assert!((v - settled).abs() <= 2);
        assert!(v > 0 && (v as i32) <= HIST_MAX);

        // a malus decays it instead of jumping to the opposite rail
        gravity(&mut v, -1200);
        assert!(v < settled);
        assert!(v > -(HIST_MAX as i16));
    }

    #[test]
    fn butterfly_distinguishes_threatened_squares() {
        let p = Position::startpos();
        let m = crate::movegen::move_from_uci(&p, "g1f3").unwrap();
        let mut h = History::new();
        h.update_quiet(&p, m, 500);
        assert!(h.quiet_score(&p, m) > 0);

        // same move keyed under a different threat picture is untouched
        let mut q = p;
        q.threats = !0;
        assert_eq!(h.quiet_score(&q, m), 0);
    }

    #[test]
    fn correction_moves_toward_observed_gap() {
        let p = Position::startpos();
        let mut h = History::new();
        assert_eq!(h.correction(&p, None), 0);
        for _ in 0..50 {
            h.update_correction(&p, None, 120, 8);
        }
        assert!(h.correction(&p, None) > 0);

        let other = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        // unrelated structure keys elsewhere; pawn and threat tables
        // almost surely land in different buckets
        assert!(h.correction(&other, None).abs() <= h.correction(&p, None));
    }
}
