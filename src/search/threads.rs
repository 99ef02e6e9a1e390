//! Lazy SMP thread pool.
//!
//! Every worker runs the same iterative-deepening search over the same
//! root. They cooperate only through the shared transposition table;
//! the divergence in move ordering is what spreads them over different
//! parts of the tree. The main worker owns the clock and raises the
//! stop flag, a coordinator thread picks the best finished worker and
//! prints `bestmove`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use log::warn;

use crate::board::Position;
use crate::eval::nnue::Network;
use crate::movegen::move_to_uci;
use crate::types::is_mate_score;

use super::time::{Limits, TimeManager};
use super::tt::TT;
use super::{SearchReport, Worker};

/// Deep copy-make recursion wants more room than the platform default.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

pub struct ThreadPool {
    tt: Arc<TT>,
    net: Arc<Network>,
    stop: Arc<AtomicBool>,
    searching: Arc<AtomicBool>,
    counters: Arc<Vec<AtomicU64>>,

    /// Idle workers; empty while a search runs.
    workers: Vec<Worker>,
    returns: Receiver<Worker>,
    return_tx: Sender<Worker>,
    num_threads: usize,
}

impl ThreadPool {
    pub fn new(num_threads: usize, tt: Arc<TT>, net: Arc<Network>) -> ThreadPool {
        let (return_tx, returns) = channel();
        let mut pool = ThreadPool {
            tt,
            net,
            stop: Arc::new(AtomicBool::new(false)),
            searching: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Vec::new()),
            workers: Vec::new(),
            returns,
            return_tx,
            num_threads: num_threads.max(1),
        };
        pool.spawn_workers();
        pool
    }

    fn spawn_workers(&mut self) {
        self.counters = Arc::new((0..self.num_threads).map(|_| AtomicU64::new(0)).collect());
        self.workers = (0..self.num_threads)
            .map(|id| {
                Worker::new(
                    id,
                    self.tt.clone(),
                    self.stop.clone(),
                    self.counters.clone(),
                    self.net.clone(),
                )
            })
            .collect();
    }

    /// Block until every worker from the previous search has come home.
    pub fn wait(&mut self) {
        while self.workers.len() < self.num_threads {
            match self.returns.recv() {
                Ok(w) => self.workers.push(w),
                Err(_) => break,
            }
        }
        self.workers.sort_by_key(|w| w.id);
        self.searching.store(false, Ordering::Relaxed);
    }

    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Resizing drops per-game worker state; fine, it happens between
    /// games in practice.
    pub fn set_threads(&mut self, n: usize) {
        self.wait();
        self.num_threads = n.clamp(1, 512);
        self.spawn_workers();
    }

    pub fn set_hash(&mut self, size_mb: usize) {
        self.wait();
        self.tt = Arc::new(TT::new(size_mb));
        self.spawn_workers();
    }

    pub fn new_game(&mut self) {
        self.wait();
        self.tt.clear();
        for w in &mut self.workers {
            w.new_game();
        }
    }

    pub fn total_nodes(&self) -> u64 {
        self.counters.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Kick off a search and return immediately so the UCI loop keeps
    /// reading input. `game_keys` carries the game line for repetition
    /// detection, root position included last.
    pub fn start_search(
        &mut self,
        root: Position,
        game_keys: &[u64],
        limits: Limits,
        move_overhead: u64,
    ) {
        self.wait();
        self.stop.store(false, Ordering::Relaxed);
        self.searching.store(true, Ordering::Relaxed);
        self.tt.age();

        let (done_tx, done_rx) = channel::<(Worker, SearchReport)>();
        for mut w in self.workers.drain(..) {
            w.set_root(root, game_keys);
            w.prepare(TimeManager::start(&limits, root.stm, move_overhead));
            let tx = done_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("search-{}", w.id))
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || {
                    let report = w.iterate();
                    // the pool outlives the search, a dead receiver
                    // means shutdown
                    let _ = tx.send((w, report));
                });
            if let Err(e) = spawned {
                warn!("failed to spawn search thread: {e}");
            }
        }
        drop(done_tx);

        let n = self.num_threads;
        let return_tx = self.return_tx.clone();
        let searching = self.searching.clone();
        let coordinator = thread::Builder::new()
            .name("coordinator".into())
            .spawn(move || {
                let mut best: Option<SearchReport> = None;
                for _ in 0..n {
                    let Ok((w, report)) = done_rx.recv() else { break };
                    if best.map_or(true, |b| better(&report, &b)) {
                        best = Some(report);
                    }
                    let _ = return_tx.send(w);
                }
                let mv = best.map_or(crate::types::Move::NULL, |b| b.best_move);
                println!("bestmove {}", move_to_uci(mv));
                searching.store(false, Ordering::Relaxed);
            });
        if let Err(e) = coordinator {
            warn!("failed to spawn coordinator thread: {e}");
        }
    }
}

/// Prefer a found mate of either sign, otherwise the deepest finished
/// iteration, score breaking ties.
fn better(a: &SearchReport, b: &SearchReport) -> bool {
    if a.best_move.is_null() {
        return false;
    }
    if b.best_move.is_null() {
        return true;
    }
    if is_mate_score(a.score) || is_mate_score(b.score) {
        return a.score > b.score;
    }
    (a.depth, a.score) > (b.depth, b.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{mate_in, Move, MoveFlag, Square};

    fn report(score: i32, depth: i32) -> SearchReport {
        SearchReport {
            best_move: Move::new(Square(8), Square(16), MoveFlag::Normal),
            score,
            depth,
        }
    }

    #[test]
    fn deeper_report_wins_ties_broken_by_score() {
        assert!(better(&report(10, 12), &report(50, 11)));
        assert!(better(&report(50, 12), &report(10, 12)));
        assert!(!better(&report(10, 12), &report(50, 12)));
    }

    #[test]
    fn shorter_mate_beats_deeper_search() {
        assert!(better(&report(mate_in(3), 9), &report(mate_in(7), 15)));
        assert!(better(&report(mate_in(3), 9), &report(200, 20)));
    }

    #[test]
    fn null_best_move_never_selected_over_real_one() {
        let mut null_report = report(0, 30);
        null_report.best_move = Move::NULL;
        assert!(better(&report(0, 1), &null_report));
        assert!(!better(&null_report, &report(0, 1)));
    }

    #[test]
    fn pool_searches_and_recovers_workers() {
        let tt = Arc::new(TT::new(2));
        let net = Arc::new(Network::seeded_default());
        let mut pool = ThreadPool::new(2, tt, net);

        let root = Position::startpos();
        let limits = Limits {
            depth: Some(3),
            ..Limits::default()
        };
        pool.start_search(root, &[root.key], limits, 0);
        pool.wait();
        assert_eq!(pool.workers.len(), 2);
        assert!(pool.total_nodes() > 0);
        assert!(!pool.is_searching());
    }
}
