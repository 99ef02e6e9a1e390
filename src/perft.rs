//! Perft node counting over the legal move generator.

use std::time::Instant;

use crate::board::Position;
use crate::movegen::{self, generate_legal};

pub fn perft(p: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal(p);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for &m in moves.as_slice() {
        let mut child = *p;
        child.apply_move(m);
        nodes += perft(&child, depth - 1);
    }
    nodes
}

/// Root-split perft with per-move counts and a nodes-per-second line,
/// matching the output other engines print for `perft` so scripts can
/// diff them.
pub fn perft_divide(p: &Position, depth: u32) -> u64 {
    let start = Instant::now();
    let mut total = 0;
    for &m in generate_legal(p).as_slice() {
        let mut child = *p;
        child.apply_move(m);
        let nodes = if depth > 1 { perft(&child, depth - 1) } else { 1 };
        total += nodes;
        println!("{}: {}", movegen::move_to_uci(m), nodes);
    }
    let elapsed = start.elapsed().as_secs_f64().max(1e-9);
    println!();
    println!("Nodes searched: {total}");
    println!("NPS: {:.0}", total as f64 / elapsed);
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(fen: &str, depth: u32) -> u64 {
        perft(&Position::from_fen(fen).unwrap(), depth)
    }

    #[test]
    fn startpos_shallow() {
        let p = Position::startpos();
        assert_eq!(perft(&p, 1), 20);
        assert_eq!(perft(&p, 2), 400);
        assert_eq!(perft(&p, 3), 8_902);
        assert_eq!(perft(&p, 4), 197_281);
    }

    #[test]
    fn kiwipete() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(count(fen, 1), 48);
        assert_eq!(count(fen, 2), 2_039);
        assert_eq!(count(fen, 3), 97_862);
    }

    #[test]
    fn bulk_counting_matches_plain_recursion() {
        // recurse all the way to depth 0 instead of taking the
        // leaf-count shortcut
        fn slow(p: &Position, depth: u32) -> u64 {
            if depth == 0 {
                return 1;
            }
            let mut nodes = 0;
            for &m in generate_legal(p).as_slice() {
                let mut child = *p;
                child.apply_move(m);
                nodes += slow(&child, depth - 1);
            }
            nodes
        }

        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let p = Position::from_fen(fen).unwrap();
        assert_eq!(perft(&p, 3), slow(&p, 3));
    }

    #[test]
    fn en_passant_and_promotion_heavy() {
        // position 3: ep discoveries
        assert_eq!(count("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4), 43_238);
        // position 5: promotions and castling interplay
        assert_eq!(
            count("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 3),
            62_379
        );
    }
}
