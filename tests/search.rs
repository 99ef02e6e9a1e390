//! End-to-end search checks: forced mates, draw recognition and limit
//! handling, run single-threaded so the results are reproducible.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use basalt::board::Position;
use basalt::eval::nnue::Network;
use basalt::movegen::{generate_legal, move_to_uci};
use basalt::search::time::{Limits, TimeManager};
use basalt::search::tt::TT;
use basalt::search::{SearchReport, Worker};
use basalt::types::{mate_in, Color};

fn search(fen: &str, limits: Limits) -> SearchReport {
    let p = Position::from_fen(fen).unwrap();
    let net = Arc::new(Network::seeded_default());
    let tt = Arc::new(TT::new(8));
    let stop = Arc::new(AtomicBool::new(false));
    let counters: Arc<Vec<AtomicU64>> = Arc::new(vec![AtomicU64::new(0)]);

    let mut worker = Worker::new(0, tt, stop, counters, net);
    worker.set_root(p, &[p.key]);
    worker.prepare(TimeManager::start(&limits, p.stm, 0));
    worker.iterate()
}

fn search_depth(fen: &str, depth: i32) -> SearchReport {
    search(
        fen,
        Limits {
            depth: Some(depth),
            ..Limits::default()
        },
    )
}

#[test]
fn finds_back_rank_mate_in_one() {
    let report = search_depth("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
    assert_eq!(report.score, mate_in(1));
    assert_eq!(move_to_uci(report.best_move), "a1a8");
}

#[test]
fn finds_rook_ladder_mate_in_two() {
    // 1.Rb7 boxes the king in, 2.Ra8 mates
    let report = search_depth("7k/8/8/8/8/8/1R6/R5K1 w - - 0 1", 6);
    assert_eq!(report.score, mate_in(3));
}

#[test]
fn checkmated_root_reports_mate_and_no_move() {
    // back-rank mate already delivered, black to move
    let report = search_depth("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", 4);
    assert!(report.best_move.is_null());
    assert_eq!(report.score, -mate_in(0).abs());
}

#[test]
fn stalemated_root_reports_draw_and_no_move() {
    let report = search_depth("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4);
    assert!(report.best_move.is_null());
    assert_eq!(report.score, 0);
}

#[test]
fn bare_kings_score_as_draw() {
    let report = search_depth("8/8/4k3/8/8/3K4/8/8 w - - 0 1", 6);
    assert_eq!(report.score, 0);
}

#[test]
fn node_limit_terminates_search() {
    let report = search(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        Limits {
            nodes: Some(20_000),
            ..Limits::default()
        },
    );
    assert!(report.depth >= 1);
    assert!(!report.best_move.is_null());
}

#[test]
fn best_move_is_always_legal() {
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    ];
    for fen in fens {
        let p = Position::from_fen(fen).unwrap();
        let report = search_depth(fen, 6);
        let legal = generate_legal(&p);
        assert!(
            legal.as_slice().contains(&report.best_move),
            "illegal best move {} in {fen}",
            move_to_uci(report.best_move)
        );
    }
}

#[test]
fn perpetual_check_holds_a_lost_position_to_a_draw() {
    // white is a rook and two pawns down, but checks on e8 and h5 walk
    // the black king between g8 and h7 with single forced replies; the
    // twofold repetition closes after four plies and bounds the score
    let report = search_depth("6k1/6p1/5p2/7Q/8/8/6K1/qr6 w - - 0 1", 8);
    assert_eq!(report.score, 0);
}

#[test]
fn seeded_game_history_flows_into_the_search() {
    // a game line where the root key already occurred; the search must
    // stay sound with repetition candidates behind the root
    let p = Position::startpos();
    let net = Arc::new(Network::seeded_default());
    let tt = Arc::new(TT::new(8));
    let stop = Arc::new(AtomicBool::new(false));
    let counters: Arc<Vec<AtomicU64>> = Arc::new(vec![AtomicU64::new(0)]);

    let mut worker = Worker::new(0, tt, stop, counters, net);
    assert_eq!(p.stm, Color::White);
    worker.set_root(p, &[p.key, 1, p.key]);
    worker.prepare(TimeManager::fixed_depth(4));
    let report = worker.iterate();
    assert!(generate_legal(&p).as_slice().contains(&report.best_move));
}

#[test]
fn reported_pv_is_playable_from_the_root() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let p = Position::from_fen(fen).unwrap();
    let net = Arc::new(Network::seeded_default());
    let tt = Arc::new(TT::new(8));
    let stop = Arc::new(AtomicBool::new(false));
    let counters: Arc<Vec<AtomicU64>> = Arc::new(vec![AtomicU64::new(0)]);

    let mut worker = Worker::new(0, tt, stop, counters, net);
    worker.set_root(p, &[p.key]);
    worker.prepare(TimeManager::fixed_depth(6));
    let report = worker.iterate();

    let pv = worker.principal_variation();
    assert!(!pv.is_empty());
    assert_eq!(pv[0], report.best_move);

    // every pv move must be legal in sequence; a stale tail from a
    // sibling line would break the chain
    let mut cur = p;
    for &m in pv {
        assert!(
            generate_legal(&cur).as_slice().contains(&m),
            "unplayable pv move {}",
            move_to_uci(m)
        );
        cur.apply_move(m);
    }
}
