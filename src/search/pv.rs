//! Principal-variation collection and the root move list.

use crate::board::Position;
use crate::movegen;
use crate::types::{Move, MAX_PLY, SCORE_MATE};

/// Triangular PV table: each ply owns a line that starts with the best
/// move found there and continues with the child's line.
pub struct PvTable {
    lines: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    lens: [usize; MAX_PLY],
}

impl PvTable {
    pub fn new() -> PvTable {
        PvTable {
            lines: Box::new([[Move::NULL; MAX_PLY]; MAX_PLY]),
            lens: [0; MAX_PLY],
        }
    }

    /// Open a fresh line at `ply`; called when entering a node so stale
    /// moves from a sibling subtree cannot leak into the reported PV.
    #[inline]
    pub fn reset(&mut self, ply: usize) {
        self.lens[ply] = 0;
    }

    /// Record `m` as the best move at `ply`, adopting the child line
    /// found at `ply + 1`.
    pub fn update(&mut self, ply: usize, m: Move) {
        let child_len = if ply + 1 < MAX_PLY { self.lens[ply + 1] } else { 0 };
        let len = (child_len + 1).min(MAX_PLY - ply);

        self.lines[ply][0] = m;
        // the child's line lives one row down, split to appease the
        // borrow checker
        let (head, tail) = self.lines.split_at_mut(ply + 1);
        head[ply][1..len].copy_from_slice(&tail[0][..len - 1]);
        self.lens[ply] = len;
    }

    pub fn line(&self, ply: usize) -> &[Move] {
        &self.lines[ply][..self.lens[ply]]
    }

    pub fn best_move(&self) -> Move {
        if self.lens[0] > 0 {
            self.lines[0][0]
        } else {
            Move::NULL
        }
    }
}

impl Default for PvTable {
    fn default() -> Self {
        PvTable::new()
    }
}

/// One legal root move with its scores from the running and the
/// previous iteration.
#[derive(Clone, Copy, Debug)]
pub struct RootMove {
    pub mv: Move,
    pub score: i32,
    pub prev_score: i32,
}

/// The legal moves of the root position, reordered after every
/// completed depth so the next iteration searches the best line first.
pub struct RootMoves {
    moves: Vec<RootMove>,
}

impl RootMoves {
    pub fn new() -> RootMoves {
        RootMoves { moves: Vec::new() }
    }

    pub fn reset(&mut self, p: &Position) {
        self.moves.clear();
        for &mv in movegen::generate_legal(p).as_slice() {
            self.moves.push(RootMove {
                mv,
                score: -SCORE_MATE,
                prev_score: -SCORE_MATE,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Roll the scores over before a new iteration starts.
    pub fn new_depth(&mut self) {
        for rm in &mut self.moves {
            rm.prev_score = rm.score;
            rm.score = -SCORE_MATE;
        }
    }

    pub fn record(&mut self, mv: Move, score: i32) {
        if let Some(rm) = self.moves.iter_mut().find(|rm| rm.mv == mv) {
            rm.score = score;
        }
    }

    /// Stable sort, best first. Moves the last iteration never reached
    /// fall back to their previous score and keep their relative order.
    pub fn sort(&mut self) {
        self.moves
            .sort_by_key(|rm| std::cmp::Reverse((rm.score, rm.prev_score)));
    }

    pub fn best(&self) -> Move {
        self.moves.first().map_or(Move::NULL, |rm| rm.mv)
    }

    pub fn as_slice(&self) -> &[RootMove] {
        &self.moves
    }
}

impl Default for RootMoves {
    fn default() -> Self {
        RootMoves::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MoveFlag, Square};

    fn m(from: u8, to: u8) -> Move {
        Move::new(Square(from), Square(to), MoveFlag::Normal)
    }

    #[test]
    fn lines_chain_upward() {
        let mut pv = PvTable::new();
        pv.reset(2);
        pv.update(2, m(20, 28));
        pv.update(1, m(10, 18));
        pv.update(0, m(0, 8));

        assert_eq!(pv.line(0), &[m(0, 8), m(10, 18), m(20, 28)]);
        assert_eq!(pv.best_move(), m(0, 8));
    }

    #[test]
    fn reset_clears_stale_children() {
        let mut pv = PvTable::new();
        pv.update(1, m(10, 18));
        pv.reset(1);
        pv.update(0, m(0, 8));
        assert_eq!(pv.line(0), &[m(0, 8)]);
    }

    #[test]
    fn root_moves_keep_the_best_line_on_top() {
        let mut rm = RootMoves::new();
        rm.reset(&Position::startpos());
        assert_eq!(rm.as_slice().len(), 20);

        let favorite = rm.as_slice()[7].mv;
        rm.record(favorite, 50);
        rm.sort();
        assert_eq!(rm.best(), favorite);

        // a fresh depth with nothing searched yet falls back to the
        // previous ordering
        rm.new_depth();
        rm.sort();
        assert_eq!(rm.best(), favorite);
    }
}
