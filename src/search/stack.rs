//! Per-ply search bookkeeping.

use crate::types::{Move, MAX_PLY};

use super::history::MoveRef;

/// One frame per ply, reused across searches. The position itself is
/// copy-make and lives on the call stack; this array carries everything
/// the heuristics want to look up across plies.
#[derive(Clone, Copy)]
pub struct StackNode {
    /// Move that produced this node's position, for continuation
    /// history and the previous-move correction. `None` after a null
    /// move and at the root.
    pub prior: Option<MoveRef>,
    /// Refutation slot filled on quiet fail-highs at this ply.
    pub killer: Move,
    /// Correction-adjusted static evaluation of this node.
    pub static_eval: i32,
    /// Raw network output before correction, kept for the correction
    /// update itself.
    pub raw_eval: i32,
    pub in_check: bool,
}

impl StackNode {
    fn empty() -> StackNode {
        StackNode {
            prior: None,
            killer: Move::NULL,
            static_eval: 0,
            raw_eval: 0,
            in_check: false,
        }
    }
}

pub struct SearchStack {
    nodes: Box<[StackNode; MAX_PLY + 4]>,
}

impl SearchStack {
    pub fn new() -> SearchStack {
        SearchStack {
            nodes: Box::new([StackNode::empty(); MAX_PLY + 4]),
        }
    }

    pub fn clear(&mut self) {
        *self.nodes = [StackNode::empty(); MAX_PLY + 4];
    }

    #[inline(always)]
    pub fn at(&self, ply: usize) -> &StackNode {
        &self.nodes[ply]
    }

    #[inline(always)]
    pub fn at_mut(&mut self, ply: usize) -> &mut StackNode {
        &mut self.nodes[ply]
    }

    /// Prior move `back` plies above `ply`, or `None` past the root.
    #[inline(always)]
    pub fn prior(&self, ply: usize, back: usize) -> Option<MoveRef> {
        if back > ply {
            return None;
        }
        self.nodes[ply - back + 1].prior
    }
}

impl Default for SearchStack {
    fn default() -> Self {
        SearchStack::new()
    }
}
