//! Precomputed attack tables: leaper attacks per square, magic-bitboard
//! slider lookups and alignment rays between square pairs.
//!
//! Everything is built once on first use and read-only afterwards, so the
//! tables are safe to share across search workers by construction. Magic
//! numbers are searched at startup with a fixed-seed RNG; the fill loop
//! rejects any candidate with destructive collisions, so a bad magic can
//! never make it into the table.

use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::types::{bb, pop_lsb, Bitboard, Color, PieceType, Square, FILE_A, FILE_H};

#[derive(Clone, Copy, Default)]
struct MagicEntry {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl MagicEntry {
    #[inline(always)]
    fn index(&self, occ: Bitboard) -> usize {
        let relevant = occ & self.mask;
        self.offset + (relevant.wrapping_mul(self.magic) >> self.shift) as usize
    }
}

pub struct Tables {
    pawn: [[Bitboard; 64]; 2],
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    between: Vec<Bitboard>, // 64 * 64, squares strictly between
    line: Vec<Bitboard>,    // 64 * 64, full shared line incl. endpoints
    bishop_magics: [MagicEntry; 64],
    rook_magics: [MagicEntry; 64],
    slider_attacks: Vec<Bitboard>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Global attack tables; built on first call, read-only afterward.
pub fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::build)
}

/// Eagerly build the tables; call once at process start so the first
/// search does not pay the initialization cost.
pub fn init() {
    let _ = tables();
}

#[inline(always)]
pub fn pawn_attacks(c: Color, sq: Square) -> Bitboard {
    tables().pawn[c.idx()][sq.idx()]
}

#[inline(always)]
pub fn knight_attacks(sq: Square) -> Bitboard {
    tables().knight[sq.idx()]
}

#[inline(always)]
pub fn king_attacks(sq: Square) -> Bitboard {
    tables().king[sq.idx()]
}

#[inline(always)]
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let t = tables();
    t.slider_attacks[t.bishop_magics[sq.idx()].index(occ)]
}

#[inline(always)]
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let t = tables();
    t.slider_attacks[t.rook_magics[sq.idx()].index(occ)]
}

#[inline(always)]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    bishop_attacks(sq, occ) | rook_attacks(sq, occ)
}

/// Attacks of a non-pawn piece type from `sq` over blockers `occ`.
pub fn piece_attacks(pt: PieceType, sq: Square, occ: Bitboard) -> Bitboard {
    match pt {
        PieceType::Knight => knight_attacks(sq),
        PieceType::Bishop => bishop_attacks(sq, occ),
        PieceType::Rook => rook_attacks(sq, occ),
        PieceType::Queen => queen_attacks(sq, occ),
        PieceType::King => king_attacks(sq),
        PieceType::Pawn => unreachable!("pawn attacks are color dependent"),
    }
}

/// Squares strictly between `a` and `b` along a shared rank, file or
/// diagonal; empty when the squares are not aligned.
#[inline(always)]
pub fn between(a: Square, b: Square) -> Bitboard {
    tables().between[a.idx() * 64 + b.idx()]
}

/// The full line through `a` and `b` (endpoints included); empty when
/// the squares are not aligned.
#[inline(always)]
pub fn line(a: Square, b: Square) -> Bitboard {
    tables().line[a.idx() * 64 + b.idx()]
}

/// All squares attacked by a pawn mass of color `c`.
#[inline(always)]
pub fn pawn_attacks_bb(c: Color, pawns: Bitboard) -> Bitboard {
    match c {
        Color::White => ((pawns & !FILE_A) << 7) | ((pawns & !FILE_H) << 9),
        Color::Black => ((pawns & !FILE_A) >> 9) | ((pawns & !FILE_H) >> 7),
    }
}

const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn ray_attacks(sq: Square, occ: Bitboard, dirs: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = 0;
    let (rank, file) = (sq.rank() as i8, sq.file() as i8);
    for &(dr, df) in dirs {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target = 1u64 << (r * 8 + f);
            attacks |= target;
            if occ & target != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

/// Relevance mask: every square a slider on `sq` can see on an empty
/// board, minus the board edge in each movement direction.
fn relevance_mask(sq: Square, dirs: &[(i8, i8); 4]) -> Bitboard {
    let mut mask = 0;
    let (rank, file) = (sq.rank() as i8, sq.file() as i8);
    for &(dr, df) in dirs {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&(r + dr)) && (0..8).contains(&(f + df)) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

/// Expand the `idx`-th subset of the set bits of `mask`.
fn blocker_subset(idx: usize, mask: Bitboard) -> Bitboard {
    let mut result = 0;
    let mut rest = mask;
    let mut i = 0;
    while rest != 0 {
        let sq = pop_lsb(&mut rest);
        if idx & (1 << i) != 0 {
            result |= bb(sq);
        }
        i += 1;
    }
    result
}

fn leaper_targets(sq: Square, deltas: &[(i8, i8)]) -> Bitboard {
    let mut out = 0;
    let (rank, file) = (sq.rank() as i8, sq.file() as i8);
    for &(dr, df) in deltas {
        let (r, f) = (rank + dr, file + df);
        if (0..8).contains(&r) && (0..8).contains(&f) {
            out |= 1u64 << (r * 8 + f);
        }
    }
    out
}

impl Tables {
    fn build() -> Tables {
        let mut pawn = [[0; 64]; 2];
        let mut knight = [0; 64];
        let mut king = [0; 64];

        for i in 0..64u8 {
            let sq = Square(i);
            pawn[Color::White.idx()][sq.idx()] = leaper_targets(sq, &[(1, -1), (1, 1)]);
            pawn[Color::Black.idx()][sq.idx()] = leaper_targets(sq, &[(-1, -1), (-1, 1)]);
            knight[sq.idx()] = leaper_targets(
                sq,
                &[(2, 1), (2, -1), (-2, 1), (-2, -1), (1, 2), (1, -2), (-1, 2), (-1, -2)],
            );
            king[sq.idx()] = leaper_targets(
                sq,
                &[(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)],
            );
        }

        let mut rng = SmallRng::seed_from_u64(0x5851_F42D_4C95_7F2D);
        let mut slider_attacks = Vec::new();
        let mut bishop_magics = [MagicEntry::default(); 64];
        let mut rook_magics = [MagicEntry::default(); 64];

        for i in 0..64u8 {
            let sq = Square(i);
            bishop_magics[sq.idx()] =
                find_magic(sq, &BISHOP_DIRS, &mut rng, &mut slider_attacks);
            rook_magics[sq.idx()] = find_magic(sq, &ROOK_DIRS, &mut rng, &mut slider_attacks);
        }

        let mut between = vec![0; 64 * 64];
        let mut line = vec![0; 64 * 64];
        for a in 0..64u8 {
            for b in 0..64u8 {
                let (sa, sb) = (Square(a), Square(b));
                if a == b {
                    continue;
                }
                let sliders: [fn(Square, Bitboard) -> Bitboard; 2] = [bishop_ref, rook_ref];
                for att in sliders {
                    if att(sa, 0) & bb(sb) != 0 {
                        between[sa.idx() * 64 + sb.idx()] = att(sa, bb(sb)) & att(sb, bb(sa));
                        line[sa.idx() * 64 + sb.idx()] =
                            (att(sa, 0) & att(sb, 0)) | bb(sa) | bb(sb);
                    }
                }
            }
        }

        Tables {
            pawn,
            knight,
            king,
            between,
            line,
            bishop_magics,
            rook_magics,
            slider_attacks,
        }
    }
}

fn bishop_ref(sq: Square, occ: Bitboard) -> Bitboard {
    ray_attacks(sq, occ, &BISHOP_DIRS)
}

fn rook_ref(sq: Square, occ: Bitboard) -> Bitboard {
    ray_attacks(sq, occ, &ROOK_DIRS)
}

/// Search a magic factor for one square and append its attack table.
///
/// A candidate is accepted only if every blocker subset maps to a slot
/// holding either nothing yet or the identical attack set, so the
/// returned entry is valid by construction.
fn find_magic(
    sq: Square,
    dirs: &[(i8, i8); 4],
    rng: &mut SmallRng,
    slider_attacks: &mut Vec<Bitboard>,
) -> MagicEntry {
    let mask = relevance_mask(sq, dirs);
    let bits = mask.count_ones();
    let size = 1usize << bits;
    let shift = 64 - bits;

    let subsets: Vec<(Bitboard, Bitboard)> = (0..size)
        .map(|idx| {
            let occ = blocker_subset(idx, mask);
            (occ, ray_attacks(sq, occ, dirs))
        })
        .collect();

    let mut table = vec![0u64; size];
    let mut used = vec![false; size];

    loop {
        // sparse candidates converge much faster than uniform ones
        let magic = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }

        table.iter_mut().for_each(|v| *v = 0);
        used.iter_mut().for_each(|v| *v = false);

        let mut ok = true;
        for &(occ, attack) in &subsets {
            let key = (occ.wrapping_mul(magic) >> shift) as usize;
            if !used[key] {
                used[key] = true;
                table[key] = attack;
            } else if table[key] != attack {
                ok = false;
                break;
            }
        }

        if ok {
            let offset = slider_attacks.len();
            slider_attacks.extend_from_slice(&table);
            return MagicEntry {
                mask,
                magic,
                shift,
                offset,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_lookup_matches_ray_walk() {
        let occs = [
            0u64,
            0x0000_0010_0800_4000,
            0xFFFF_0000_0000_FFFF,
            0x0102_0408_1020_4080,
        ];
        for i in 0..64u8 {
            let sq = Square(i);
            for &occ in &occs {
                assert_eq!(bishop_attacks(sq, occ), bishop_ref(sq, occ), "bishop {sq}");
                assert_eq!(rook_attacks(sq, occ), rook_ref(sq, occ), "rook {sq}");
            }
        }
    }

    #[test]
    fn between_and_line() {
        let a1 = Square::parse("a1").unwrap();
        let h8 = Square::parse("h8").unwrap();
        let e4 = Square::parse("e4").unwrap();
        let c4 = Square::parse("c4").unwrap();
        assert_eq!(between(a1, h8).count_ones(), 6);
        assert_eq!(between(c4, e4), bb(Square::parse("d4").unwrap()));
        assert_eq!(between(a1, e4), 0);
        assert_ne!(line(a1, h8) & bb(a1), 0);
        assert_eq!(line(a1, e4), 0);
    }

    #[test]
    fn pawn_mass_attacks_match_per_square() {
        let pawns: Bitboard = 0x0000_0000_0042_A500;
        for c in Color::BOTH {
            let mut expected = 0;
            for sq in crate::types::BitIter(pawns) {
                expected |= pawn_attacks(c, sq);
            }
            assert_eq!(pawn_attacks_bb(c, pawns), expected);
        }
    }
}
