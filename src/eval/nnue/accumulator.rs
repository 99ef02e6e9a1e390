//! Lazily updated accumulator chain, one entry per search ply.
//!
//! Applying a move records which features changed; the hidden-layer
//! sums are only brought up to date when a node actually asks for an
//! evaluation. Nodes that get pruned before evaluation never pay for
//! the vector work. When evaluation is requested the chain walks back
//! to the nearest valid entry and replays the recorded deltas forward;
//! a king move that crosses a bucket or mirror boundary invalidates the
//! whole perspective and forces a from-scratch refresh instead.

use crate::board::{castling, Position};
use crate::types::{BitIter, Color, Move, PieceType, Square, MAX_PLY};

use super::network::{self, king_bucket, needs_mirror, Network, HIDDEN};

/// Feature changes caused by one move: at most two activations
/// (castling) and two deactivations (capture or castling).
#[derive(Clone, Copy, Debug)]
pub struct DirtyPieces {
    adds: [(Color, PieceType, Square); 2],
    subs: [(Color, PieceType, Square); 2],
    n_add: u8,
    n_sub: u8,
}

impl Default for DirtyPieces {
    fn default() -> Self {
        // the slot contents are sentinels; n_add/n_sub keep unused
        // slots unread
        DirtyPieces {
            adds: [(Color::White, PieceType::Pawn, Square(0)); 2],
            subs: [(Color::White, PieceType::Pawn, Square(0)); 2],
            n_add: 0,
            n_sub: 0,
        }
    }
}

impl DirtyPieces {
    /// Derive the feature deltas for `m` played by `us`. `moved` and
    /// `captured` come from `Position::apply_move`.
    pub fn from_move(us: Color, m: Move, moved: PieceType, captured: Option<PieceType>) -> Self {
        let mut d = DirtyPieces::default();
        let from = m.from();
        let to = m.to();

        if m.is_castling() {
            let kingside = from < to;
            d.sub(us, PieceType::King, from);
            d.sub(us, PieceType::Rook, to);
            d.add(us, PieceType::King, castling::king_destination(us, kingside));
            d.add(us, PieceType::Rook, castling::rook_destination(us, kingside));
            return d;
        }

        d.sub(us, moved, from);
        if let Some(victim) = captured {
            let victim_sq = if m.is_en_passant() {
                if us == Color::White { to.offset(-8) } else { to.offset(8) }
            } else {
                to
            };
            d.sub(!us, victim, victim_sq);
        }
        let placed = if m.is_promotion() { m.promo_type() } else { moved };
        d.add(us, placed, to);
        d
    }

    fn add(&mut self, c: Color, pt: PieceType, sq: Square) {
        self.adds[self.n_add as usize] = (c, pt, sq);
        self.n_add += 1;
    }

    fn sub(&mut self, c: Color, pt: PieceType, sq: Square) {
        self.subs[self.n_sub as usize] = (c, pt, sq);
        self.n_sub += 1;
    }
}

#[derive(Clone, Copy)]
struct Entry {
    values: [[i16; HIDDEN]; 2],
    computed: [bool; 2],
    /// Replaying past this entry is invalid for the flagged
    /// perspective; only a refresh helps.
    refresh: [bool; 2],
    dirty: DirtyPieces,
    bucket: [usize; 2],
    mirror: [bool; 2],
}

impl Entry {
    fn empty() -> Entry {
        Entry {
            values: [[0; HIDDEN]; 2],
            computed: [false; 2],
            refresh: [false; 2],
            dirty: DirtyPieces::default(),
            bucket: [0; 2],
            mirror: [false; 2],
        }
    }
}

pub struct AccumulatorStack {
    stack: Vec<Entry>,
    top: usize,
}

impl AccumulatorStack {
    pub fn new() -> AccumulatorStack {
        AccumulatorStack {
            stack: vec![Entry::empty(); MAX_PLY + 1],
            top: 0,
        }
    }

    /// Reset the chain to a fresh root position.
    pub fn reset(&mut self, p: &Position, net: &Network) {
        self.top = 0;
        for persp in Color::BOTH {
            let i = persp.idx();
            self.stack[0].bucket[i] = king_bucket(persp, p.king_sq(persp));
            self.stack[0].mirror[i] = needs_mirror(p.king_sq(persp));
        }
        refresh_entry(&mut self.stack[0], Color::White, p, net);
        refresh_entry(&mut self.stack[0], Color::Black, p, net);
    }

    /// Record the move leading to the child node. `child` is the
    /// position after the move.
    pub fn push(&mut self, child: &Position, us: Color, m: Move, moved: PieceType, captured: Option<PieceType>) {
        let dirty = DirtyPieces::from_move(us, m, moved, captured);
        self.push_entry(child, Some((us, moved)), dirty);
    }

    /// Null move: no feature changes, the replay step degenerates to a
    /// copy.
    pub fn push_null(&mut self, child: &Position) {
        self.push_entry(child, None, DirtyPieces::default());
    }

    fn push_entry(&mut self, child: &Position, king_move: Option<(Color, PieceType)>, dirty: DirtyPieces) {
        debug_assert!(self.top + 1 < self.stack.len());
        let parent = self.top;
        self.top += 1;

        let (bucket, mirror) = (self.stack[parent].bucket, self.stack[parent].mirror);
        let entry = &mut self.stack[self.top];
        entry.computed = [false; 2];
        entry.refresh = [false; 2];
        entry.dirty = dirty;
        entry.bucket = bucket;
        entry.mirror = mirror;

        if let Some((us, moved)) = king_move {
            if moved == PieceType::King {
                let i = us.idx();
                let ksq = child.king_sq(us);
                let nb = king_bucket(us, ksq);
                let nm = needs_mirror(ksq);
                if nb != entry.bucket[i] || nm != entry.mirror[i] {
                    entry.refresh[i] = true;
                    entry.bucket[i] = nb;
                    entry.mirror[i] = nm;
                }
            }
        }
    }

    pub fn pop(&mut self) {
        debug_assert!(self.top > 0);
        self.top -= 1;
    }

    /// Evaluate the current node, updating whatever part of the chain
    /// the forward pass needs.
    pub fn evaluate(&mut self, p: &Position, net: &Network) -> i32 {
        self.ensure(Color::White, p, net);
        self.ensure(Color::Black, p, net);

        let entry = &self.stack[self.top];
        let (us, them) = match p.stm {
            Color::White => (&entry.values[0], &entry.values[1]),
            Color::Black => (&entry.values[1], &entry.values[0]),
        };
        net.forward(us, them, network::output_bucket(p.occupied()))
    }

    fn ensure(&mut self, persp: Color, p: &Position, net: &Network) {
        let i = persp.idx();
        if self.stack[self.top].computed[i] {
            return;
        }

        // walk back to the nearest usable entry
        let mut start = self.top;
        loop {
            if self.stack[start].refresh[i] {
                refresh_entry(&mut self.stack[self.top], persp, p, net);
                return;
            }
            if self.stack[start - 1].computed[i] {
                break;
            }
            start -= 1;
        }

        // replay deltas forward; bucket and mirror are constant across
        // the replayed span or a refresh flag would have stopped us
        for j in start..=self.top {
            let (before, after) = self.stack.split_at_mut(j);
            let parent = &before[j - 1];
            let entry = &mut after[0];

            entry.values[i] = parent.values[i];
            apply_dirty(entry, persp, net);
            entry.computed[i] = true;
        }
    }
}

impl Default for AccumulatorStack {
    fn default() -> Self {
        AccumulatorStack::new()
    }
}

fn apply_dirty(entry: &mut Entry, persp: Color, net: &Network) {
    let i = persp.idx();
    let (bucket, mirror) = (entry.bucket[i], entry.mirror[i]);
    let dirty = entry.dirty;

    for k in 0..dirty.n_sub as usize {
        let (c, pt, sq) = dirty.subs[k];
        let row = net.feature_row(network::feature_index(persp, bucket, mirror, c, pt, sq));
        for (v, w) in entry.values[i].iter_mut().zip(row) {
            *v -= w;
        }
    }
    for k in 0..dirty.n_add as usize {
        let (c, pt, sq) = dirty.adds[k];
        let row = net.feature_row(network::feature_index(persp, bucket, mirror, c, pt, sq));
        for (v, w) in entry.values[i].iter_mut().zip(row) {
            *v += w;
        }
    }
}

/// Rebuild one perspective of `entry` from the full position.
fn refresh_entry(entry: &mut Entry, persp: Color, p: &Position, net: &Network) {
    let i = persp.idx();
    let ksq = p.king_sq(persp);
    entry.bucket[i] = king_bucket(persp, ksq);
    entry.mirror[i] = needs_mirror(ksq);

    let mut values = [0i16; HIDDEN];
    values.copy_from_slice(&net.feature_bias);

    for c in Color::BOTH {
        for pt in PieceType::ALL {
            for sq in BitIter(p.pieces(c, pt)) {
                let row = net.feature_row(network::feature_index(
                    persp,
                    entry.bucket[i],
                    entry.mirror[i],
                    c,
                    pt,
                    sq,
                ));
                for (v, w) in values.iter_mut().zip(row) {
                    *v += w;
                }
            }
        }
    }

    entry.values[i] = values;
    entry.computed[i] = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::move_from_uci;

    fn net() -> Network {
        Network::seeded_default()
    }

    fn fresh_eval(p: &Position, net: &Network) -> i32 {
        let mut accs = AccumulatorStack::new();
        accs.reset(p, net);
        accs.evaluate(p, net)
    }

    fn play(accs: &mut AccumulatorStack, p: &mut Position, mv: &str) {
        let m = move_from_uci(p, mv).unwrap();
        let us = p.stm;
        let (moved, captured) = p.apply_move(m);
        accs.push(p, us, m, moved, captured);
    }

    #[test]
    fn incremental_matches_refresh() {
        let net = net();
        let mut p = Position::startpos();
        let mut accs = AccumulatorStack::new();
        accs.reset(&p, &net);

        for mv in ["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a5", "e1e2"] {
            play(&mut accs, &mut p, mv);
            assert_eq!(accs.evaluate(&p, &net), fresh_eval(&p, &net), "after {mv}");
        }
    }

    #[test]
    fn castling_and_promotion_deltas() {
        let net = net();
        let mut p =
            Position::from_fen("r3k2r/1P6/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mut accs = AccumulatorStack::new();
        accs.reset(&p, &net);

        // white castles long, black short, then the b-pawn captures the
        // untouched a8 rook and promotes
        for mv in ["e1c1", "e8g8", "b7a8q"] {
            play(&mut accs, &mut p, mv);
            assert_eq!(accs.evaluate(&p, &net), fresh_eval(&p, &net), "after {mv}");
        }
    }

    #[test]
    fn dirty_counts_match_the_move_kind() {
        let empty = DirtyPieces::default();
        assert_eq!((empty.n_add, empty.n_sub), (0, 0));

        let p = Position::startpos();
        let quiet = move_from_uci(&p, "g1f3").unwrap();
        let d = DirtyPieces::from_move(Color::White, quiet, PieceType::Knight, None);
        assert_eq!((d.n_add, d.n_sub), (1, 1));

        let castle = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let m = move_from_uci(&castle, "e1g1").unwrap();
        let d = DirtyPieces::from_move(Color::White, m, PieceType::King, None);
        assert_eq!((d.n_add, d.n_sub), (2, 2));
    }

    #[test]
    fn lazy_chain_skips_unevaluated_plies() {
        let net = net();
        let mut p = Position::startpos();
        let mut accs = AccumulatorStack::new();
        accs.reset(&p, &net);

        // push three plies, evaluate only at the end
        for mv in ["g1f3", "g8f6", "d2d4"] {
            play(&mut accs, &mut p, mv);
        }
        assert_eq!(accs.evaluate(&p, &net), fresh_eval(&p, &net));

        // popping back re-exposes the already computed parent
        accs.pop();
        accs.pop();
        accs.pop();
        let root = Position::startpos();
        assert_eq!(accs.evaluate(&root, &net), fresh_eval(&root, &net));
    }

    #[test]
    fn null_move_keeps_values() {
        let net = net();
        let mut p = Position::startpos();
        let mut accs = AccumulatorStack::new();
        accs.reset(&p, &net);
        accs.evaluate(&p, &net);

        p.apply_null_move();
        accs.push_null(&p);
        assert_eq!(accs.evaluate(&p, &net), fresh_eval(&p, &net));
    }
}
