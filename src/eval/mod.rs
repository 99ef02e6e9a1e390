//! Static evaluation: the NNUE forward pass plus game-state scaling.

pub mod nnue;

use crate::board::Position;
use crate::types::SCORE_EVAL_MAX;

use nnue::{AccumulatorStack, Network};

/// Raw static evaluation from the side to move's point of view. The
/// fifty-move damping pulls scores toward zero as the clock runs down,
/// so the search prefers making progress over shuffling.
pub fn evaluate(p: &Position, net: &Network, accs: &mut AccumulatorStack) -> i32 {
    let raw = accs.evaluate(p, net);
    let damped = raw * (200 - p.halfmove_clock as i32) / 200;
    damped.clamp(-SCORE_EVAL_MAX + 1, SCORE_EVAL_MAX - 1)
}
