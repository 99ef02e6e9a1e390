//! Zobrist keys for incremental position hashing.
//!
//! Generated once from a fixed seed so hashes are stable across runs,
//! which keeps benches and `go nodes` runs deterministic.

use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::types::{Color, PieceType, Square};

struct Keys {
    piece: [[[u64; 64]; 6]; 2],
    castling: [u64; 16],
    ep_file: [u64; 8],
    side: u64,
}

static KEYS: OnceLock<Keys> = OnceLock::new();

fn keys() -> &'static Keys {
    KEYS.get_or_init(|| {
        let mut rng = SmallRng::seed_from_u64(0xF00D_F00D_DEAD_BEEF);
        let mut piece = [[[0u64; 64]; 6]; 2];
        for c in &mut piece {
            for pt in c.iter_mut() {
                for sq in pt.iter_mut() {
                    *sq = rng.gen();
                }
            }
        }
        let mut castling = [0u64; 16];
        for k in &mut castling {
            *k = rng.gen();
        }
        let mut ep_file = [0u64; 8];
        for k in &mut ep_file {
            *k = rng.gen();
        }
        Keys {
            piece,
            castling,
            ep_file,
            side: rng.gen(),
        }
    })
}

#[inline(always)]
pub fn piece_key(c: Color, pt: PieceType, sq: Square) -> u64 {
    keys().piece[c.idx()][pt.idx()][sq.idx()]
}

#[inline(always)]
pub fn castling_key(rights: u8) -> u64 {
    debug_assert!(rights < 16);
    keys().castling[rights as usize]
}

/// En-passant keys are per file: the target square's rank is implied by
/// the side to move.
#[inline(always)]
pub fn ep_key(sq: Square) -> u64 {
    keys().ep_file[sq.file() as usize]
}

#[inline(always)]
pub fn side_key() -> u64 {
    keys().side
}
