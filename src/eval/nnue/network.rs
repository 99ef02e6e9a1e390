//! Network parameters and the quantized forward pass.
//!
//! Topology: 768 piece-square features per perspective, duplicated over
//! four king-placement buckets and mirrored so the king always sits on
//! the queenside half, a 256-wide hidden layer with squared-clipped-ReLU
//! activation, and eight material-bucketed output heads.

use anyhow::{bail, Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::types::{Color, PieceType, Square};

pub const INPUT: usize = 768;
pub const KING_BUCKETS: usize = 4;
pub const HIDDEN: usize = 256;
pub const OUTPUT_BUCKETS: usize = 8;

pub const QA: i32 = 255;
pub const QB: i32 = 64;
pub const EVAL_SCALE: i32 = 400;

/// King-placement bucket per relative, mirror-normalized square. The
/// mirror step keeps the king on files a-d, so only the left half is
/// ever indexed; the right half repeats it for symmetry.
#[rustfmt::skip]
const KING_BUCKET_MAP: [usize; 64] = [
    0, 0, 1, 1, 1, 1, 0, 0,
    0, 0, 1, 1, 1, 1, 0, 0,
    2, 2, 2, 2, 2, 2, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 2,
    3, 3, 3, 3, 3, 3, 3, 3,
    3, 3, 3, 3, 3, 3, 3, 3,
    3, 3, 3, 3, 3, 3, 3, 3,
    3, 3, 3, 3, 3, 3, 3, 3,
];

/// True when `ksq` lies on the kingside half and the perspective's
/// features must be mirrored.
#[inline(always)]
pub fn needs_mirror(ksq: Square) -> bool {
    ksq.file() >= 4
}

#[inline(always)]
pub fn king_bucket(persp: Color, ksq: Square) -> usize {
    let mut sq = ksq.relative(persp);
    if needs_mirror(ksq) {
        sq = sq.flip_file();
    }
    KING_BUCKET_MAP[sq.idx()]
}

/// Row index into the feature-weight matrix for one piece seen from one
/// perspective.
#[inline(always)]
pub fn feature_index(
    persp: Color,
    bucket: usize,
    mirror: bool,
    c: Color,
    pt: PieceType,
    sq: Square,
) -> usize {
    let mut sq = sq.relative(persp);
    if mirror {
        sq = sq.flip_file();
    }
    let side = usize::from(c != persp);
    bucket * INPUT + side * 384 + pt.idx() * 64 + sq.idx()
}

/// Output head selection by total piece count, two kings excluded.
#[inline(always)]
pub fn output_bucket(occupied: u64) -> usize {
    const DIV: usize = (32 + 1) / OUTPUT_BUCKETS;
    (occupied.count_ones() as usize - 2) / DIV
}

pub struct Network {
    /// `[KING_BUCKETS * INPUT]` rows of `HIDDEN` weights.
    pub feature_weights: Vec<i16>,
    pub feature_bias: Vec<i16>,
    /// `[OUTPUT_BUCKETS]` rows of `2 * HIDDEN` weights, our perspective
    /// first.
    pub output_weights: Vec<i16>,
    pub output_bias: [i16; OUTPUT_BUCKETS],
}

impl Network {
    #[inline(always)]
    pub fn feature_row(&self, idx: usize) -> &[i16] {
        &self.feature_weights[idx * HIDDEN..(idx + 1) * HIDDEN]
    }

    /// Squared-clipped-ReLU forward pass over both perspective halves.
    /// Lane products reach QA² · |w|, so the sum runs in 64 bits before
    /// the dequantization divide.
    pub fn forward(&self, us: &[i16; HIDDEN], them: &[i16; HIDDEN], bucket: usize) -> i32 {
        let weights = &self.output_weights[bucket * 2 * HIDDEN..(bucket + 1) * 2 * HIDDEN];

        let mut sum: i64 = 0;
        for (half, w) in [(us, &weights[..HIDDEN]), (them, &weights[HIDDEN..])] {
            for (&v, &wi) in half.iter().zip(w) {
                let act = (v as i32).clamp(0, QA);
                sum += (act * act) as i64 * wi as i64;
            }
        }

        let out = (sum / QA as i64) as i32 + self.output_bias[bucket] as i32;
        out * EVAL_SCALE / (QA * QB)
    }

    /// Parse a raw little-endian parameter dump: feature weights,
    /// feature bias, output weights, output bias, in that order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Network> {
        let fw = KING_BUCKETS * INPUT * HIDDEN;
        let ow = OUTPUT_BUCKETS * 2 * HIDDEN;
        let expected = 2 * (fw + HIDDEN + ow + OUTPUT_BUCKETS);
        if bytes.len() != expected {
            bail!(
                "network file holds {} bytes, expected {expected}",
                bytes.len()
            );
        }

        let mut values = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]));
        let mut take = |n: usize| -> Vec<i16> { values.by_ref().take(n).collect() };

        let feature_weights = take(fw);
        let feature_bias = take(HIDDEN);
        let output_weights = take(ow);
        let ob = take(OUTPUT_BUCKETS);

        let mut output_bias = [0i16; OUTPUT_BUCKETS];
        output_bias.copy_from_slice(&ob);

        Ok(Network {
            feature_weights,
            feature_bias,
            output_weights,
            output_bias,
        })
    }

    pub fn load(path: &str) -> Result<Network> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading network file {path}"))?;
        Self::from_bytes(&bytes)
    }

    /// Deterministic fallback net used when no parameter file is given.
    /// The weights are small random values around a material-like
    /// signal, enough for move ordering and tests to behave sensibly;
    /// strength comes from a trained file supplied at runtime.
    pub fn seeded_default() -> Network {
        let mut rng = SmallRng::seed_from_u64(0x7E57_0000_5EED_0001);

        let material: [i32; 6] = [100, 320, 330, 500, 900, 0];
        let fw = KING_BUCKETS * INPUT * HIDDEN;

        let mut feature_weights = vec![0i16; fw];
        for (i, w) in feature_weights.iter_mut().enumerate() {
            let feature = (i / HIDDEN) % INPUT;
            let side = feature / 384;
            let pt = (feature % 384) / 64;
            // push material signal into a handful of lanes, noise into
            // the rest
            let lane = i % HIDDEN;
            let base = if lane < 8 {
                let v = material[pt] / 8;
                if side == 0 { v } else { -v }
            } else {
                0
            };
            *w = (base + rng.gen_range(-4..=4)) as i16;
        }

        let feature_bias: Vec<i16> = (0..HIDDEN).map(|_| rng.gen_range(-8..=8)).collect();
        let output_weights: Vec<i16> = (0..OUTPUT_BUCKETS * 2 * HIDDEN)
            .map(|i| {
                let half = (i / HIDDEN) % 2;
                let lane = i % HIDDEN;
                let base = if lane < 8 {
                    if half == 0 { 24 } else { -24 }
                } else {
                    0
                };
                (base + rng.gen_range(-2..=2)) as i16
            })
            .collect();
        let output_bias = [0i16; OUTPUT_BUCKETS];

        Network {
            feature_weights,
            feature_bias,
            output_weights,
            output_bias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_index_perspectives_mirror() {
        // a white pawn on e2 from white's view with mirroring maps to d2
        let idx = feature_index(
            Color::White,
            0,
            true,
            Color::White,
            PieceType::Pawn,
            Square::parse("e2").unwrap(),
        );
        assert_eq!(idx, Square::parse("d2").unwrap().idx());

        // same piece from black's view: enemy pawn, rank-flipped
        let idx = feature_index(
            Color::Black,
            0,
            false,
            Color::White,
            PieceType::Pawn,
            Square::parse("e2").unwrap(),
        );
        assert_eq!(idx, 384 + Square::parse("e7").unwrap().idx());
    }

    #[test]
    fn king_bucket_is_mirror_symmetric() {
        for sq in 0..64u8 {
            let sq = Square(sq);
            assert_eq!(
                king_bucket(Color::White, sq),
                king_bucket(Color::White, sq.flip_file())
            );
            assert_eq!(
                king_bucket(Color::White, sq),
                king_bucket(Color::Black, sq.flip_rank())
            );
        }
    }

    #[test]
    fn output_bucket_bounds() {
        // two bare kings up to the full 32 pieces
        assert_eq!(output_bucket(0b11), 0);
        assert_eq!(output_bucket(0xFFFF_FFFF), OUTPUT_BUCKETS - 1);
        assert_eq!(output_bucket(0xFFFF_0000_0000_FFFF), OUTPUT_BUCKETS - 1);
    }

    #[test]
    fn from_bytes_rejects_wrong_size() {
        assert!(Network::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn seeded_default_roundtrips_forward() {
        let net = Network::seeded_default();
        let us = [QA as i16; HIDDEN];
        let them = [0i16; HIDDEN];
        let a = net.forward(&us, &them, 0);
        let b = net.forward(&us, &them, 0);
        assert_eq!(a, b);
    }
}
