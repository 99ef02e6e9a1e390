//! Deep perft over the standard validation suite. Every number here is
//! the published reference count; a single miss means the move
//! generator, legality filter or make-move path is wrong.

use basalt::board::Position;
use basalt::perft::perft;
use pretty_assertions::assert_eq;

fn count(fen: &str, depth: u32) -> u64 {
    perft(&Position::from_fen(fen).unwrap(), depth)
}

#[test]
fn startpos_depth_5() {
    assert_eq!(perft(&Position::startpos(), 5), 4_865_609);
}

#[test]
fn kiwipete_depth_4() {
    assert_eq!(
        count(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            4
        ),
        4_085_603
    );
}

#[test]
fn endgame_pins_and_ep_depth_5() {
    assert_eq!(count("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 5), 674_624);
}

#[test]
fn promotion_heavy_depth_4() {
    assert_eq!(
        count(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            4
        ),
        422_333
    );
}

#[test]
fn talkchess_position_depth_4() {
    assert_eq!(
        count("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 4),
        2_103_487
    );
}

#[test]
fn symmetric_middlegame_depth_4() {
    assert_eq!(
        count(
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            4
        ),
        3_894_594
    );
}

#[test]
fn mirrored_positions_count_identically() {
    // position 4 from the suite and its color-flipped mirror
    let a = count(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        3,
    );
    let b = count(
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
        3,
    );
    assert_eq!(a, b);
}
