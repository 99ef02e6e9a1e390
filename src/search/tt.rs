//! Shared transposition table.
//!
//! Lock-free: workers probe and store concurrently with relaxed atomics
//! and no locks. Each entry keeps its key XOR-ed with its data, so a
//! torn read surfaces as a key mismatch instead of garbage being
//! trusted. A stale or lost entry only costs search quality; every move
//! played is still legality-checked upstream.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::types::{Move, SCORE_MATE_IN_MAX};

pub const MIN_SIZE_MB: usize = 1;
pub const MAX_SIZE_MB: usize = 32 * 1024;
pub const DEFAULT_SIZE_MB: usize = 64;

const BUCKET_SIZE: usize = 4;
const AGE_MASK: u8 = 0b1_1111;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    None = 0,
    Upper = 1,
    Lower = 2,
    Exact = 3,
}

impl Bound {
    fn from_bits(b: u64) -> Bound {
        match b & 0b11 {
            0 => Bound::None,
            1 => Bound::Upper,
            2 => Bound::Lower,
            _ => Bound::Exact,
        }
    }
}

/// Decoded probe result with the score already re-based to the probing
/// node's ply.
#[derive(Clone, Copy, Debug)]
pub struct TtHit {
    pub score: i32,
    pub mv: Move,
    pub depth: i32,
    pub bound: Bound,
    pub pv: bool,
}

struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

struct Bucket {
    slots: [Slot; BUCKET_SIZE],
}

pub struct TT {
    buckets: Vec<Bucket>,
    generation: AtomicU8,
}

// data layout: score i16 | move u16 | depth u8 | bound 2b, pv 1b, age 5b
fn pack(score: i16, mv: Move, depth: u8, bound: Bound, pv: bool, age: u8) -> u64 {
    (score as u16 as u64)
        | ((mv.0 as u64) << 16)
        | ((depth as u64) << 32)
        | ((bound as u64) << 40)
        | ((pv as u64) << 42)
        | (((age & AGE_MASK) as u64) << 43)
}

fn unpack_score(data: u64) -> i16 {
    data as u16 as i16
}

fn unpack_depth(data: u64) -> u8 {
    (data >> 32) as u8
}

fn unpack_age(data: u64) -> u8 {
    ((data >> 43) as u8) & AGE_MASK
}

/// Mate scores go into the table relative to the storing node, so a
/// cached "mate in N from here" stays correct when another ply probes
/// it. The offset direction follows the score's sign.
fn score_to_tt(score: i32, ply: usize) -> i16 {
    debug_assert!(score.abs() < crate::types::SCORE_TIMEOUT);
    if score >= SCORE_MATE_IN_MAX {
        (score + ply as i32) as i16
    } else if score <= -SCORE_MATE_IN_MAX {
        (score - ply as i32) as i16
    } else {
        score as i16
    }
}

fn score_from_tt(score: i16, ply: usize) -> i32 {
    let score = score as i32;
    if score >= SCORE_MATE_IN_MAX {
        score - ply as i32
    } else if score <= -SCORE_MATE_IN_MAX {
        score + ply as i32
    } else {
        score
    }
}

impl TT {
    pub fn new(size_mb: usize) -> TT {
        let mut tt = TT {
            buckets: Vec::new(),
            generation: AtomicU8::new(0),
        };
        tt.resize(size_mb);
        tt
    }

    /// Reallocate to the requested size; the table is empty afterwards.
    pub fn resize(&mut self, size_mb: usize) {
        let size_mb = size_mb.clamp(MIN_SIZE_MB, MAX_SIZE_MB);
        let bytes = size_mb * 1024 * 1024;
        let count = bytes / std::mem::size_of::<Bucket>();

        self.buckets = (0..count)
            .map(|_| Bucket {
                slots: std::array::from_fn(|_| Slot {
                    key: AtomicU64::new(0),
                    data: AtomicU64::new(0),
                }),
            })
            .collect();
        self.generation.store(0, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for bucket in &self.buckets {
            for slot in &bucket.slots {
                slot.key.store(0, Ordering::Relaxed);
                slot.data.store(0, Ordering::Relaxed);
            }
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Bump the generation; called once per `go` so replacement can
    /// prefer slots from earlier searches.
    pub fn age(&self) {
        let g = self.generation.load(Ordering::Relaxed);
        self.generation.store((g + 1) & AGE_MASK, Ordering::Relaxed);
    }

    #[inline]
    fn bucket(&self, key: u64) -> &Bucket {
        // multiply-high maps the key uniformly without a modulo
        let idx = ((key as u128 * self.buckets.len() as u128) >> 64) as usize;
        &self.buckets[idx]
    }

    pub fn probe(&self, key: u64, ply: usize) -> Option<TtHit> {
        for slot in &self.bucket(key).slots {
            let stored_key = slot.key.load(Ordering::Relaxed);
            let data = slot.data.load(Ordering::Relaxed);
            if stored_key ^ data == key && data != 0 {
                return Some(TtHit {
                    score: score_from_tt(unpack_score(data), ply),
                    mv: Move((data >> 16) as u16),
                    depth: unpack_depth(data) as i32,
                    bound: Bound::from_bits(data >> 40),
                    pv: (data >> 42) & 1 != 0,
                });
            }
        }
        None
    }

    /// Store one search result. `nodes` seeds the replacement pick when
    /// the bucket holds neither a match nor an empty slot; with every
    /// worker's node count drifting independently this spreads evictions
    /// without locks or starvation.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &self,
        key: u64,
        score: i32,
        mv: Move,
        depth: i32,
        bound: Bound,
        pv: bool,
        ply: usize,
        nodes: u64,
    ) {
        let age = self.generation.load(Ordering::Relaxed);
        let bucket = self.bucket(key);

        let mut target = None;
        for slot in &bucket.slots {
            let stored_key = slot.key.load(Ordering::Relaxed);
            let data = slot.data.load(Ordering::Relaxed);
            if data == 0 {
                target = Some(slot);
                break;
            }
            if stored_key ^ data == key {
                // keep a recent, much deeper entry over a shallow rewrite
                if unpack_age(data) == age && unpack_depth(data) as i32 > depth + 4 {
                    return;
                }
                target = Some(slot);
                break;
            }
        }
        let slot = match target {
            Some(s) => s,
            None => &bucket.slots[(nodes % BUCKET_SIZE as u64) as usize],
        };

        let depth = depth.clamp(0, u8::MAX as i32) as u8;
        let data = pack(score_to_tt(score, ply), mv, depth, bound, pv, age);
        slot.key.store(key ^ data, Ordering::Relaxed);
        slot.data.store(data, Ordering::Relaxed);
    }

    /// Approximate fill rate in permille, sampled like other engines
    /// report it for `info hashfull`.
    pub fn hashfull(&self) -> usize {
        let age = self.generation.load(Ordering::Relaxed);
        let mut filled = 0;
        for bucket in self.buckets.iter().take(250) {
            for slot in &bucket.slots {
                let data = slot.data.load(Ordering::Relaxed);
                if data != 0 && unpack_age(data) == age {
                    filled += 1;
                }
            }
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{mate_in, MoveFlag, Square};

    fn mv() -> Move {
        Move::new(Square(12), Square(28), MoveFlag::Normal)
    }

    #[test]
    fn store_probe_roundtrip() {
        let tt = TT::new(1);
        tt.store(0xABCD, 123, mv(), 7, Bound::Exact, true, 3, 0);
        let hit = tt.probe(0xABCD, 3).unwrap();
        assert_eq!(hit.score, 123);
        assert_eq!(hit.mv, mv());
        assert_eq!(hit.depth, 7);
        assert_eq!(hit.bound, Bound::Exact);
        assert!(hit.pv);
        assert!(tt.probe(0xABCE, 3).is_none());
    }

    #[test]
    fn mate_scores_rebase_both_signs() {
        let tt = TT::new(1);

        // mate for us, found 5 plies deep: a node 2 plies deep probing
        // the same position must see the mate as further away
        tt.store(1, mate_in(5), mv(), 10, Bound::Exact, true, 5, 0);
        let hit = tt.probe(1, 2).unwrap();
        assert_eq!(hit.score, mate_in(2));

        // getting mated re-bases in the other direction
        tt.store(2, -mate_in(5), mv(), 10, Bound::Exact, true, 5, 0);
        let hit = tt.probe(2, 2).unwrap();
        assert_eq!(hit.score, -mate_in(2));
    }

    #[test]
    fn deep_recent_entry_survives_shallow_rewrite() {
        let tt = TT::new(1);
        tt.store(7, 50, mv(), 20, Bound::Exact, false, 0, 0);
        tt.store(7, -10, Move::NULL, 2, Bound::Upper, false, 0, 0);
        let hit = tt.probe(7, 0).unwrap();
        assert_eq!(hit.depth, 20);
        assert_eq!(hit.score, 50);
    }

    #[test]
    fn aged_entries_lose_protection() {
        let tt = TT::new(1);
        tt.store(7, 50, mv(), 20, Bound::Exact, false, 0, 0);
        tt.age();
        tt.store(7, -10, mv(), 2, Bound::Upper, false, 0, 0);
        assert_eq!(tt.probe(7, 0).unwrap().depth, 2);
    }

    #[test]
    fn bucket_overflow_evicts_by_node_count() {
        let mut tt = TT::new(1);
        // shrink to one bucket so all keys collide
        tt.buckets.truncate(1);
        for k in 1..=4u64 {
            tt.store(k, k as i32, mv(), 5, Bound::Exact, false, 0, 0);
        }
        tt.store(99, 99, mv(), 5, Bound::Exact, false, 0, 2);
        assert!(tt.probe(99, 0).is_some());
        // the slot picked by nodes % 4 lost its old entry
        assert!(tt.probe(3, 0).is_none());
    }
}
