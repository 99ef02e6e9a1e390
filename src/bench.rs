//! Fixed-depth search over a small position suite. The total node count
//! doubles as a signature: any functional search change shifts it, so
//! regressions show up before any games are played.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::board::Position;
use crate::eval::nnue::Network;
use crate::search::time::TimeManager;
use crate::search::tt::TT;
use crate::search::Worker;

pub const DEFAULT_DEPTH: i32 = 10;

/// Mix of openings, middlegames, endgames and mate threats.
const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "r2q1rk1/ppp2ppp/2n1bn2/2b1p3/3pP3/3P1NPP/PPP1NPB1/R1BQ1RK1 b - - 1 9",
    "2kr3r/pp1q1ppp/5n2/1Nb5/2Pp1B2/7Q/P4PPP/1R3RK1 w - - 1 17",
    "3r1rk1/p5pp/bpp1pp2/8/q1PP1P2/b3P3/P2NQRPP/1R2B1K1 b - - 6 22",
    "8/8/1p1r1k2/p1pPN1p1/P3KnP1/1P6/8/3R4 b - - 2 52",
    "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
    "8/8/8/8/5kp1/P7/8/1K1N4 w - - 0 1",
];

pub fn run(depth: i32) -> Result<()> {
    let net = Arc::new(Network::seeded_default());
    let tt = Arc::new(TT::new(16));
    let stop = Arc::new(AtomicBool::new(false));
    let counters: Arc<Vec<AtomicU64>> = Arc::new(vec![AtomicU64::new(0)]);
    let mut worker = Worker::new(0, tt.clone(), stop.clone(), counters.clone(), net);

    let start = Instant::now();
    let mut total_nodes = 0u64;

    for (i, fen) in POSITIONS.iter().enumerate() {
        let p = Position::from_fen(fen).with_context(|| format!("bench position {i}"))?;
        println!("position {}/{}: {fen}", i + 1, POSITIONS.len());

        stop.store(false, Ordering::Relaxed);
        tt.age();
        worker.set_root(p, &[p.key]);
        worker.prepare(TimeManager::fixed_depth(depth));
        worker.iterate();
        total_nodes += counters[0].load(Ordering::Relaxed);
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-9);
    println!();
    println!("{total_nodes} nodes");
    println!("{:.0} nps", total_nodes as f64 / elapsed);
    Ok(())
}
