//! Time and node budgets for one `go` command.

use std::time::{Duration, Instant};

use crate::types::{Color, MAX_PLY};

/// Parsed `go` parameters. Everything unset means "search forever until
/// stopped".
#[derive(Clone, Copy, Debug, Default)]
pub struct Limits {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u64>,
    pub movetime: Option<u64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

/// Budget checks polled by the search. The hard limit aborts mid-tree;
/// the soft limit only stops starting a new depth, so a nearly finished
/// iteration gets to run out.
pub struct TimeManager {
    start: Instant,
    hard: Option<Duration>,
    soft: Option<Duration>,
    pub max_depth: i32,
    soft_nodes: u64,
    hard_nodes: u64,
}

impl TimeManager {
    pub fn start(limits: &Limits, us: Color, move_overhead: u64) -> TimeManager {
        let mut tm = TimeManager {
            start: Instant::now(),
            hard: None,
            soft: None,
            max_depth: MAX_PLY as i32 - 1,
            soft_nodes: u64::MAX,
            hard_nodes: u64::MAX,
        };

        if let Some(nodes) = limits.nodes {
            // a plain node budget behaves as a soft limit with generous
            // headroom, which keeps searches reproducible
            tm.soft_nodes = nodes;
            tm.hard_nodes = nodes.saturating_mul(20);
            return tm;
        }
        if let Some(depth) = limits.depth {
            tm.max_depth = depth.clamp(1, MAX_PLY as i32 - 1);
            return tm;
        }
        if limits.infinite {
            return tm;
        }
        if let Some(movetime) = limits.movetime {
            let d = Duration::from_millis(movetime.saturating_sub(move_overhead).max(1));
            tm.hard = Some(d);
            tm.soft = Some(d);
            return tm;
        }

        let (time, inc) = match us {
            Color::White => (limits.wtime, limits.winc),
            Color::Black => (limits.btime, limits.binc),
        };
        let Some(time) = time else {
            return tm;
        };
        let time = time.saturating_sub(move_overhead).max(1);
        let inc = inc.unwrap_or(0);

        let (hard, soft) = match limits.movestogo {
            Some(mtg) => {
                let mtg = mtg.max(1);
                (time / mtg.min(2) + inc / 2, time / mtg + inc / 2)
            }
            None => (time / 5 + inc / 2, time / 30 + inc / 2),
        };
        tm.hard = Some(Duration::from_millis(hard.max(1)));
        tm.soft = Some(Duration::from_millis(soft.max(1)));
        tm
    }

    /// Fixed budget used by `bench`.
    pub fn fixed_depth(depth: i32) -> TimeManager {
        TimeManager::start(
            &Limits {
                depth: Some(depth),
                ..Limits::default()
            },
            Color::White,
            0,
        )
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Checked inside the tree; aborts the current search.
    #[inline]
    pub fn hard_timeout(&self, nodes: u64) -> bool {
        if nodes >= self.hard_nodes {
            return true;
        }
        match self.hard {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }

    /// Checked between depths; finishing the current one is fine.
    pub fn soft_timeout(&self, nodes: u64) -> bool {
        if nodes >= self.soft_nodes {
            return true;
        }
        match self.soft {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_budget_without_clock_never_times_out() {
        let tm = TimeManager::start(
            &Limits {
                nodes: Some(1000),
                ..Limits::default()
            },
            Color::White,
            10,
        );
        assert!(!tm.hard_timeout(999));
        assert!(tm.hard_timeout(20_000));
        assert!(tm.soft_timeout(1000));
        assert!(!tm.soft_timeout(999));
    }

    #[test]
    fn depth_limit_caps_iterations() {
        let tm = TimeManager::fixed_depth(9);
        assert_eq!(tm.max_depth, 9);
        assert!(!tm.soft_timeout(u64::MAX - 1));
    }

    #[test]
    fn clock_split_uses_soft_and_hard_fractions() {
        let tm = TimeManager::start(
            &Limits {
                wtime: Some(30_010),
                winc: Some(2_000),
                ..Limits::default()
            },
            Color::White,
            10,
        );
        assert_eq!(tm.hard, Some(Duration::from_millis(30_000 / 5 + 1_000)));
        assert_eq!(tm.soft, Some(Duration::from_millis(30_000 / 30 + 1_000)));
    }
}
