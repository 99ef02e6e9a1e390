//! The search engine: iterative deepening with aspiration windows over
//! a negamax/alpha-beta tree, quiescence at the leaves, and the usual
//! family of pruning heuristics. One `Worker` per thread; workers only
//! share the transposition table, the stop flag and their published
//! node counters.

pub mod history;
pub mod picker;
pub mod pv;
pub mod see;
pub mod stack;
pub mod threads;
pub mod time;
pub mod tt;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use log::debug;

use crate::board::Position;
use crate::eval::nnue::{AccumulatorStack, Network};
use crate::movegen::{self, MoveList};
use crate::types::{
    is_mate_score, is_terminal_score, mated_in, Move, PieceType, MAX_PLY, SCORE_DRAW,
    SCORE_EVAL_MAX, SCORE_MATE, SCORE_MATE_IN_MAX, SCORE_TIMEOUT,
};

use history::{stat_bonus, History, MoveRef};
use picker::MovePicker;
use pv::{PvTable, RootMoves};
use stack::SearchStack;
use time::TimeManager;
use tt::{Bound, TT};

const ASPIRATION_MIN_DEPTH: i32 = 5;
const ASPIRATION_DELTA: i32 = 30;

const RFP_MAX_DEPTH: i32 = 8;
const RFP_MARGIN: i32 = 80;
const RAZOR_MAX_DEPTH: i32 = 4;
const RAZOR_MARGIN: i32 = 300;
const NMP_MIN_DEPTH: i32 = 3;
const FUTILITY_MAX_DEPTH: i32 = 8;
const FUTILITY_BASE: i32 = 100;
const FUTILITY_SCALE: i32 = 150;
const LMP_MAX_DEPTH: i32 = 8;
const SEE_CAPTURE_SCALE: i32 = -100;
const SEE_QUIET_SCALE: i32 = -40;
const HISTORY_PRUNE_DEPTH: i32 = 4;
const HISTORY_PRUNE_SCALE: i32 = -2048;
const QS_FUTILITY_MARGIN: i32 = 100;

const POLL_INTERVAL: u64 = 2048;

/// Late-move reduction baseline by depth and move number.
fn lmr_reduction(depth: i32, moves: usize) -> i32 {
    static TABLE: OnceLock<[[i8; 64]; 64]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut t = [[0i8; 64]; 64];
        for (d, row) in t.iter_mut().enumerate().skip(1) {
            for (m, r) in row.iter_mut().enumerate().skip(1) {
                *r = (0.8 + (d as f64).ln() * (m as f64).ln() / 2.25) as i8;
            }
        }
        t
    });
    table[depth.clamp(0, 63) as usize][moves.min(63)] as i32
}

/// Outcome of one worker's full iterative-deepening run.
#[derive(Clone, Copy, Debug)]
pub struct SearchReport {
    pub best_move: Move,
    pub score: i32,
    pub depth: i32,
}

pub struct Worker {
    pub id: usize,
    main: bool,

    tt: Arc<TT>,
    stop: Arc<AtomicBool>,
    /// One published counter per worker, summed for `info nodes` and
    /// the node budget.
    counters: Arc<Vec<AtomicU64>>,
    net: Arc<Network>,

    pub history: History,
    stack: SearchStack,
    accs: AccumulatorStack,
    pv: PvTable,
    root_moves: RootMoves,

    root: Position,
    /// Hash keys of the game line plus the current search path, newest
    /// last; used for twofold repetition detection.
    keys: Vec<u64>,

    tm: TimeManager,
    nodes: u64,
    seldepth: usize,
    stopped: bool,

    pub completed_depth: i32,
    pub best_move: Move,
    pub best_score: i32,
}

impl Worker {
    pub fn new(
        id: usize,
        tt: Arc<TT>,
        stop: Arc<AtomicBool>,
        counters: Arc<Vec<AtomicU64>>,
        net: Arc<Network>,
    ) -> Worker {
        Worker {
            id,
            main: id == 0,
            tt,
            stop,
            counters,
            net,
            history: History::new(),
            stack: SearchStack::new(),
            accs: AccumulatorStack::new(),
            pv: PvTable::new(),
            root_moves: RootMoves::new(),
            root: Position::startpos(),
            keys: Vec::new(),
            tm: TimeManager::fixed_depth(1),
            nodes: 0,
            seldepth: 0,
            stopped: false,
            completed_depth: 0,
            best_move: Move::NULL,
            best_score: -SCORE_MATE,
        }
    }

    /// Reset per-game state; histories only survive within one game.
    pub fn new_game(&mut self) {
        self.history.clear();
        self.stack.clear();
    }

    /// Install the root for the next search. `game_keys` holds the hash
    /// keys of every position of the game so far, root included last.
    pub fn set_root(&mut self, root: Position, game_keys: &[u64]) {
        self.root = root;
        self.keys.clear();
        self.keys.extend_from_slice(game_keys);
        if self.keys.last() != Some(&root.key) {
            self.keys.push(root.key);
        }
    }

    pub fn prepare(&mut self, tm: TimeManager) {
        self.tm = tm;
        self.nodes = 0;
        self.seldepth = 0;
        self.stopped = false;
        self.completed_depth = 0;
        self.best_move = Move::NULL;
        self.best_score = -SCORE_MATE;
        self.counters[self.id].store(0, Ordering::Relaxed);
        self.stack.clear();
        self.accs.reset(&self.root, &self.net);
    }

    fn total_nodes(&self) -> u64 {
        self.counters.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// The iterative-deepening driver. Returns the final report; the
    /// main worker prints `info` lines as depths complete.
    pub fn iterate(&mut self) -> SearchReport {
        self.root_moves.reset(&self.root);
        if self.root_moves.is_empty() {
            debug!("no legal moves at root");
            return SearchReport {
                best_move: Move::NULL,
                score: if self.root.in_check() { mated_in(0) } else { SCORE_DRAW },
                depth: 0,
            };
        }
        // always have a sane answer, even on instant stop
        self.best_move = self.root_moves.best();

        let mut score = 0;
        for depth in 1..=self.tm.max_depth {
            self.seldepth = 0;
            self.root_moves.new_depth();
            let s = self.aspiration(depth, score);
            if self.stopped {
                break;
            }
            score = s;
            self.completed_depth = depth;
            self.best_score = score;
            self.root_moves.sort();
            let best = self.pv.best_move();
            if !best.is_null() {
                self.best_move = best;
            }
            self.publish_nodes();

            if self.main {
                self.print_info(depth, score);
                if self.tm.soft_timeout(self.total_nodes()) {
                    self.stop.store(true, Ordering::Relaxed);
                    break;
                }
            }
        }

        // helpers keep searching until the main worker stops them
        if self.main {
            self.stop.store(true, Ordering::Relaxed);
        }
        self.publish_nodes();

        SearchReport {
            best_move: self.best_move,
            score: self.best_score,
            depth: self.completed_depth,
        }
    }

    /// One aspiration-window pass: search a narrow window around the
    /// previous score and widen on failure. Shallow depths run full
    /// width, their scores swing too much for a window to pay off.
    fn aspiration(&mut self, depth: i32, prev_score: i32) -> i32 {
        let mut delta = ASPIRATION_DELTA;
        let (mut alpha, mut beta) = if depth >= ASPIRATION_MIN_DEPTH {
            (
                (prev_score - delta).max(-SCORE_MATE),
                (prev_score + delta).min(SCORE_MATE),
            )
        } else {
            (-SCORE_MATE, SCORE_MATE)
        };

        loop {
            let root = self.root;
            let score = self.negamax(&root, alpha, beta, depth, 0, true);
            if self.stopped {
                return score;
            }
            if score <= alpha {
                alpha = (alpha - delta).max(-SCORE_MATE);
            } else if score >= beta {
                beta = (beta + delta).min(SCORE_MATE);
            } else {
                return score;
            }
            delta += delta / 2;
        }
    }

    fn publish_nodes(&self) {
        self.counters[self.id].store(self.nodes, Ordering::Relaxed);
    }

    /// Poll budgets and the shared stop flag. Cheap enough to call at
    /// every node; the expensive clock read is amortized.
    #[inline]
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if self.nodes % POLL_INTERVAL == 0 {
            self.publish_nodes();
            if self.stop.load(Ordering::Relaxed)
                || (self.main && self.tm.hard_timeout(self.total_nodes()))
            {
                self.stop.store(true, Ordering::Relaxed);
                self.stopped = true;
            }
        }
        self.stopped
    }

    /// Twofold repetition along the game/search line. The scan steps by
    /// two (same side to move) and cannot reach past the last
    /// irreversible move.
    fn is_repetition(&self, p: &Position) -> bool {
        let len = self.keys.len();
        let limit = p.halfmove_clock as usize;
        let mut back = 2;
        while back <= limit && back < len {
            if self.keys[len - 1 - back] == p.key {
                return true;
            }
            back += 2;
        }
        false
    }

    fn negamax(
        &mut self,
        p: &Position,
        mut alpha: i32,
        mut beta: i32,
        depth: i32,
        ply: usize,
        is_pv: bool,
    ) -> i32 {
        if depth <= 0 {
            return self.qsearch(p, alpha, beta, ply, is_pv);
        }

        self.pv.reset(ply);
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.should_stop() {
            return SCORE_TIMEOUT;
        }

        let root = ply == 0;
        let in_check = p.in_check();

        if !root {
            if p.is_fifty_move_draw() || p.is_insufficient_material() || self.is_repetition(p) {
                return SCORE_DRAW;
            }
            if ply >= MAX_PLY - 1 {
                return if in_check { SCORE_DRAW } else { self.evaluate(p, ply) };
            }

            // mate-distance pruning: even a forced mate here cannot
            // beat a shorter one already found above us
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(SCORE_MATE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        let tt_hit = self.tt.probe(p.key, ply);
        // at the root the previous iteration's ordering takes precedence
        // over whatever survived in the table
        let tt_move = if root {
            self.root_moves.best()
        } else {
            tt_hit.map_or(Move::NULL, |h| h.mv)
        };
        if let Some(hit) = tt_hit {
            if !is_pv && hit.depth >= depth {
                let usable = match hit.bound {
                    Bound::Exact => true,
                    Bound::Lower => hit.score >= beta,
                    Bound::Upper => hit.score <= alpha,
                    Bound::None => false,
                };
                if usable {
                    return hit.score;
                }
            }
        }

        let (raw_eval, static_eval) = if in_check {
            (-SCORE_MATE, -SCORE_MATE)
        } else {
            let raw = self.evaluate(p, ply);
            let corrected =
                raw + self.history.correction(p, self.stack.prior(ply, 1));
            (raw, corrected.clamp(-SCORE_EVAL_MAX + 1, SCORE_EVAL_MAX - 1))
        };
        {
            let node = self.stack.at_mut(ply);
            node.raw_eval = raw_eval;
            node.static_eval = static_eval;
            node.in_check = in_check;
        }
        let improving = !in_check
            && ply >= 2
            && self.stack.at(ply - 2).static_eval != -SCORE_MATE
            && static_eval > self.stack.at(ply - 2).static_eval;

        // whole-node pruning, skipped in PV nodes and while in check
        if !is_pv && !in_check {
            // reverse futility: so far above beta that even a large
            // swing keeps us there
            if depth <= RFP_MAX_DEPTH
                && static_eval - RFP_MARGIN * (depth - i32::from(improving)) >= beta
                && !is_terminal_score(beta)
            {
                return static_eval;
            }

            // razoring: hopeless nodes drop straight into quiescence
            if depth <= RAZOR_MAX_DEPTH
                && !is_terminal_score(alpha)
                && static_eval + RAZOR_MARGIN * depth < alpha
            {
                let score = self.qsearch(p, alpha, beta, ply, false);
                if self.stopped {
                    return SCORE_TIMEOUT;
                }
                if score < alpha {
                    return score;
                }
            }

            // null move: hand over the turn; if the reply still cannot
            // reach beta the real position is very likely a cutoff
            if depth >= NMP_MIN_DEPTH
                && static_eval >= beta
                && self.stack.prior(ply, 1).is_some()
                && p.has_non_pawn_material(p.stm)
            {
                let r = 3 + depth / 3 + ((static_eval - beta) / 200).min(3);
                let mut child = *p;
                child.apply_null_move();
                self.keys.push(child.key);
                self.accs.push_null(&child);
                self.stack.at_mut(ply + 1).prior = None;

                let score =
                    -self.negamax(&child, -beta, -beta + 1, depth - r, ply + 1, false);

                self.accs.pop();
                self.keys.pop();
                if self.stopped {
                    return SCORE_TIMEOUT;
                }
                if score >= beta {
                    // never return unproven mates from a null search
                    return if is_terminal_score(score) { beta } else { score };
                }
            }
        }

        let killer = self.stack.at(ply).killer;
        let prior1 = self.stack.prior(ply, 1);
        let prior2 = self.stack.prior(ply, 2);

        let mut picker = MovePicker::new(p, tt_move, killer, false);
        let mut best_score = -SCORE_MATE;
        let mut best_move = Move::NULL;
        let mut bound = Bound::Upper;
        let mut played = 0usize;
        let mut quiets_tried = MoveList::new();
        let mut captures_tried = MoveList::new();

        while let Some(m) = picker.next(p, &self.history, prior1, prior2) {
            if !p.is_legal(m) {
                continue;
            }

            let capture = p.is_capture(m);
            let quiet = !capture && !m.is_promotion();
            let moved = match p.piece_type_on(m.from()) {
                Some(pt) => pt,
                None => continue,
            };

            // shallow-depth move pruning once any line is banked; a
            // terminal alpha would let the margins discard a shorter
            // mating move, so quiets are never pruned against one
            if !root && best_score > -SCORE_MATE_IN_MAX {
                if quiet && !in_check && !is_terminal_score(alpha) {
                    let lmp_limit = (2 + depth * depth) / if improving { 1 } else { 2 };
                    if depth <= LMP_MAX_DEPTH && played >= lmp_limit as usize {
                        picker.skip_quiets();
                        continue;
                    }
                    if depth <= FUTILITY_MAX_DEPTH
                        && static_eval + FUTILITY_BASE + FUTILITY_SCALE * depth <= alpha
                    {
                        picker.skip_quiets();
                        continue;
                    }
                    let hist = self.history.quiet_score(p, m)
                        + self.history.continuation_score(
                            prior1,
                            MoveRef { color: p.stm, piece: moved, to: m.to() },
                        );
                    if depth <= HISTORY_PRUNE_DEPTH && hist < HISTORY_PRUNE_SCALE * depth {
                        continue;
                    }
                }
                // discard moves that lose too much material for the
                // depth that remains
                let see_margin = if capture {
                    SEE_CAPTURE_SCALE * depth
                } else {
                    SEE_QUIET_SCALE * depth * depth
                };
                if depth <= 10 && !see::see(p, m, see_margin) {
                    continue;
                }
            }

            let mut child = *p;
            let (moved, captured) = child.apply_move(m);
            played += 1;

            self.keys.push(child.key);
            self.accs.push(&child, p.stm, m, moved, captured);
            self.stack.at_mut(ply + 1).prior = Some(MoveRef {
                color: p.stm,
                piece: moved,
                to: m.to(),
            });

            let gives_check = child.in_check();
            let new_depth = depth - 1 + i32::from(gives_check);

            let score = if played == 1 {
                -self.negamax(&child, -beta, -alpha, new_depth, ply + 1, is_pv)
            } else {
                // late quiets get a reduced null-window look first
                let mut r = 0;
                if depth >= 3 && quiet && !in_check && !gives_check {
                    r = lmr_reduction(depth, played);
                    r -= i32::from(is_pv);
                    r -= i32::from(improving);
                    r = r.clamp(0, (new_depth - 1).max(0));
                }

                let mut s =
                    -self.negamax(&child, -alpha - 1, -alpha, new_depth - r, ply + 1, false);
                if s > alpha && r > 0 {
                    s = -self.negamax(&child, -alpha - 1, -alpha, new_depth, ply + 1, false);
                }
                if s > alpha && is_pv {
                    s = -self.negamax(&child, -beta, -alpha, new_depth, ply + 1, true);
                }
                s
            };

            self.accs.pop();
            self.keys.pop();
            if self.stopped {
                return SCORE_TIMEOUT;
            }

            if quiet {
                quiets_tried.push(m);
            } else if capture {
                captures_tried.push(m);
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = m;
                    alpha = score;
                    bound = Bound::Exact;
                    if root {
                        self.root_moves.record(m, score);
                    }
                    if is_pv {
                        self.pv.update(ply, m);
                    }
                    if score >= beta {
                        bound = Bound::Lower;
                        if quiet {
                            self.stack.at_mut(ply).killer = m;
                        }
                        self.update_ordering_stats(
                            p, m, moved, capture, depth, &quiets_tried, &captures_tried,
                            prior1, prior2,
                        );
                        break;
                    }
                }
            }
        }

        if played == 0 {
            return if in_check { mated_in(ply) } else { SCORE_DRAW };
        }

        debug_assert!(best_score.abs() <= SCORE_MATE);
        self.tt.store(
            p.key, best_score, best_move, depth, bound, is_pv, ply, self.nodes,
        );

        // teach the corrections how far the static eval missed, but only
        // when the result actually bounds it
        if !in_check
            && (best_move.is_null() || (!p.is_capture(best_move) && !best_move.is_promotion()))
            && !(bound == Bound::Lower && best_score <= static_eval)
            && !(bound == Bound::Upper && best_score >= static_eval)
            && !is_terminal_score(best_score)
        {
            // the gap is measured against the raw network output so the
            // correction does not feed back into itself
            self.history.update_correction(
                p,
                self.stack.prior(ply, 1),
                best_score - raw_eval,
                depth,
            );
        }

        best_score
    }

    #[allow(clippy::too_many_arguments)]
    fn update_ordering_stats(
        &mut self,
        p: &Position,
        m: Move,
        moved: PieceType,
        capture: bool,
        depth: i32,
        quiets_tried: &MoveList,
        captures_tried: &MoveList,
        prior1: Option<MoveRef>,
        prior2: Option<MoveRef>,
    ) {
        let bonus = stat_bonus(depth);
        let cur = MoveRef { color: p.stm, piece: moved, to: m.to() };

        if capture {
            self.history.update_capture(p, m, moved, bonus);
        } else {
            self.history.update_quiet(p, m, bonus);
            self.history.update_continuation(prior1, cur, bonus);
            self.history.update_continuation(prior2, cur, bonus);

            // the quiets that failed to cut get pushed down
            for &q in quiets_tried.as_slice() {
                if q == m {
                    continue;
                }
                let qmoved = match p.piece_type_on(q.from()) {
                    Some(pt) => pt,
                    None => continue,
                };
                let qref = MoveRef { color: p.stm, piece: qmoved, to: q.to() };
                self.history.update_quiet(p, q, -bonus);
                self.history.update_continuation(prior1, qref, -bonus);
                self.history.update_continuation(prior2, qref, -bonus);
            }
        }

        // captures tried before any cutoff lose standing either way
        for &c in captures_tried.as_slice() {
            if c == m {
                continue;
            }
            if let Some(att) = p.piece_type_on(c.from()) {
                self.history.update_capture(p, c, att, -bonus);
            }
        }
    }

    fn qsearch(&mut self, p: &Position, mut alpha: i32, beta: i32, ply: usize, is_pv: bool) -> i32 {
        // quiescence never extends the PV, so the line ends here
        self.pv.reset(ply);
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.should_stop() {
            return SCORE_TIMEOUT;
        }

        if p.is_fifty_move_draw() || p.is_insufficient_material() || self.is_repetition(p) {
            return SCORE_DRAW;
        }

        let in_check = p.in_check();
        if ply >= MAX_PLY - 1 {
            return if in_check { SCORE_DRAW } else { self.evaluate(p, ply) };
        }

        let tt_hit = self.tt.probe(p.key, ply);
        if let Some(hit) = tt_hit {
            if !is_pv {
                let usable = match hit.bound {
                    Bound::Exact => true,
                    Bound::Lower => hit.score >= beta,
                    Bound::Upper => hit.score <= alpha,
                    Bound::None => false,
                };
                if usable {
                    return hit.score;
                }
            }
        }

        let mut best_score = -SCORE_MATE;
        let mut static_eval = -SCORE_MATE;
        if !in_check {
            // stand pat: doing nothing is always an option outside check
            static_eval = self.evaluate(p, ply)
                + self.history.correction(p, self.stack.prior(ply, 1));
            static_eval = static_eval.clamp(-SCORE_EVAL_MAX + 1, SCORE_EVAL_MAX - 1);
            if static_eval >= beta {
                return static_eval;
            }
            alpha = alpha.max(static_eval);
            best_score = static_eval;
        }

        let tt_move = tt_hit.map_or(Move::NULL, |h| h.mv);
        let prior1 = self.stack.prior(ply, 1);
        let prior2 = self.stack.prior(ply, 2);
        let mut picker = MovePicker::new(p, tt_move, Move::NULL, true);
        let mut best_move = Move::NULL;
        let mut bound = Bound::Upper;
        let mut played = 0usize;

        while let Some(m) = picker.next(p, &self.history, prior1, prior2) {
            if !p.is_legal(m) {
                continue;
            }

            // delta pruning: even banking the victim cannot lift alpha
            if !in_check {
                if let Some(victim) = p.captured_piece_type(m) {
                    if static_eval + see::value(victim) + QS_FUTILITY_MARGIN <= alpha
                        && !m.is_promotion()
                    {
                        continue;
                    }
                }
            }

            let mut child = *p;
            let (moved, captured) = child.apply_move(m);
            played += 1;

            self.keys.push(child.key);
            self.accs.push(&child, p.stm, m, moved, captured);
            self.stack.at_mut(ply + 1).prior = Some(MoveRef {
                color: p.stm,
                piece: moved,
                to: m.to(),
            });

            let score = -self.qsearch(&child, -beta, -alpha, ply + 1, is_pv);

            self.accs.pop();
            self.keys.pop();
            if self.stopped {
                return SCORE_TIMEOUT;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    best_move = m;
                    bound = Bound::Exact;
                    if score >= beta {
                        bound = Bound::Lower;
                        break;
                    }
                }
            }
        }

        if in_check && played == 0 {
            return mated_in(ply);
        }

        self.tt
            .store(p.key, best_score, best_move, 0, bound, is_pv, ply, self.nodes);
        best_score
    }

    fn evaluate(&mut self, p: &Position, _ply: usize) -> i32 {
        crate::eval::evaluate(p, &self.net, &mut self.accs)
    }

    /// The line reported for the last completed depth.
    pub fn principal_variation(&self) -> &[Move] {
        self.pv.line(0)
    }

    fn print_info(&self, depth: i32, score: i32) {
        self.publish_nodes();
        let nodes = self.total_nodes();
        let elapsed = self.tm.elapsed();
        let ms = elapsed.as_millis().max(1);
        let nps = nodes as u128 * 1000 / ms;

        let score_str = if is_mate_score(score) {
            let plies = SCORE_MATE - score.abs();
            let moves = (plies + 1) / 2;
            format!("score mate {}", if score > 0 { moves } else { -moves })
        } else {
            format!("score cp {score}")
        };

        let pv: Vec<String> = self
            .pv
            .line(0)
            .iter()
            .map(|&m| movegen::move_to_uci(m))
            .collect();

        println!(
            "info depth {depth} seldepth {} {score_str} nodes {nodes} nps {nps} hashfull {} time {ms} pv {}",
            self.seldepth,
            self.tt.hashfull(),
            pv.join(" "),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_lines_read_freshly_published_counters() {
        let counters: Arc<Vec<AtomicU64>> = Arc::new(vec![AtomicU64::new(0)]);
        let mut w = Worker::new(
            0,
            Arc::new(TT::new(2)),
            Arc::new(AtomicBool::new(false)),
            counters.clone(),
            Arc::new(Network::seeded_default()),
        );
        let p = Position::startpos();
        w.set_root(p, &[p.key]);
        w.prepare(TimeManager::fixed_depth(1));

        w.nodes = 4321;
        w.print_info(1, 0);
        assert_eq!(counters[0].load(Ordering::Relaxed), 4321);
    }
}
