//! UCI protocol front end.
//!
//! One blocking loop over stdin. `go` hands the position to the thread
//! pool and returns immediately, so `stop` and `isready` stay
//! responsive while the search runs; the pool's coordinator prints
//! `bestmove` when the workers finish.

use std::io::{self, BufRead};
use std::sync::Arc;

use log::warn;

use crate::board::Position;
use crate::eval::nnue::Network;
use crate::movegen::move_from_uci;
use crate::perft;
use crate::search::threads::ThreadPool;
use crate::search::time::Limits;
use crate::search::tt::{self, TT};

const NAME: &str = concat!("Basalt ", env!("CARGO_PKG_VERSION"));
const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

const DEFAULT_MOVE_OVERHEAD: u64 = 10;

pub struct Uci {
    pool: ThreadPool,
    net: Arc<Network>,
    pos: Position,
    /// Hash keys of every position of the game line, current last.
    keys: Vec<u64>,
    threads: usize,
    hash_mb: usize,
    move_overhead: u64,
}

impl Uci {
    pub fn new() -> Uci {
        let net = Arc::new(Network::seeded_default());
        let tt = Arc::new(TT::new(tt::DEFAULT_SIZE_MB));
        let pos = Position::startpos();
        Uci {
            pool: ThreadPool::new(1, tt, net.clone()),
            net,
            keys: vec![pos.key],
            pos,
            threads: 1,
            hash_mb: tt::DEFAULT_SIZE_MB,
            move_overhead: DEFAULT_MOVE_OVERHEAD,
        }
    }

    pub fn run_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(s) => s,
                Err(_) => break,
            };
            if !self.handle_line(line.trim()) {
                break;
            }
        }
        self.pool.stop();
        self.pool.wait();
    }

    /// Returns `false` on `quit`.
    fn handle_line(&mut self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        let Some(cmd) = tokens.next() else {
            return true;
        };
        let rest: Vec<&str> = tokens.collect();

        match cmd {
            "uci" => self.cmd_uci(),
            "isready" => println!("readyok"),
            "setoption" => self.cmd_setoption(&rest),
            "ucinewgame" => self.cmd_ucinewgame(),
            "position" => self.cmd_position(&rest),
            "go" => self.cmd_go(&rest),
            "stop" => self.pool.stop(),
            "perft" => {
                let depth = rest
                    .first()
                    .and_then(|s| s.parse::<u32>().ok())
                    .unwrap_or(5);
                perft::perft_divide(&self.pos, depth);
            }
            "bench" => {
                let depth = rest.first().and_then(|s| s.parse::<i32>().ok());
                if let Err(e) = crate::bench::run(depth.unwrap_or(crate::bench::DEFAULT_DEPTH)) {
                    warn!("bench failed: {e:#}");
                }
            }
            "eval" => self.cmd_eval(),
            "d" => print_board(&self.pos),
            "quit" => return false,
            _ => warn!("unknown command: {line}"),
        }
        true
    }

    fn cmd_uci(&self) {
        println!("id name {NAME}");
        println!("id author {AUTHOR}");
        println!(
            "option name Hash type spin default {} min {} max {}",
            tt::DEFAULT_SIZE_MB,
            tt::MIN_SIZE_MB,
            tt::MAX_SIZE_MB
        );
        println!("option name Threads type spin default 1 min 1 max 512");
        println!("option name MoveOverhead type spin default {DEFAULT_MOVE_OVERHEAD} min 0 max 5000");
        println!("option name EvalFile type string default <internal>");
        println!("uciok");
    }

    fn cmd_setoption(&mut self, args: &[&str]) {
        // setoption name <id> [value <x>]
        let name_pos = args.iter().position(|&t| t == "name");
        let value_pos = args.iter().position(|&t| t == "value");
        let Some(np) = name_pos else {
            warn!("setoption without name");
            return;
        };
        let name = args[np + 1..value_pos.unwrap_or(args.len())].join(" ");
        let value = value_pos.map(|vp| args[vp + 1..].join(" ")).unwrap_or_default();

        match name.to_ascii_lowercase().as_str() {
            "hash" => match value.parse::<usize>() {
                Ok(mb) => {
                    self.hash_mb = mb.clamp(tt::MIN_SIZE_MB, tt::MAX_SIZE_MB);
                    self.pool.set_hash(self.hash_mb);
                }
                Err(_) => warn!("bad Hash value: {value}"),
            },
            "threads" => match value.parse::<usize>() {
                Ok(n) => {
                    self.threads = n.clamp(1, 512);
                    self.pool.set_threads(self.threads);
                }
                Err(_) => warn!("bad Threads value: {value}"),
            },
            "moveoverhead" => match value.parse::<u64>() {
                Ok(ms) => self.move_overhead = ms.min(5000),
                Err(_) => warn!("bad MoveOverhead value: {value}"),
            },
            "evalfile" => match Network::load(&value) {
                Ok(net) => {
                    self.net = Arc::new(net);
                    self.rebuild_pool();
                }
                Err(e) => warn!("failed to load network from {value}: {e:#}"),
            },
            _ => warn!("unknown option: {name}"),
        }
    }

    fn rebuild_pool(&mut self) {
        self.pool.stop();
        self.pool.wait();
        let tt = Arc::new(TT::new(self.hash_mb));
        self.pool = ThreadPool::new(self.threads, tt, self.net.clone());
    }

    fn cmd_ucinewgame(&mut self) {
        self.pool.new_game();
        self.pos = Position::startpos();
        self.keys = vec![self.pos.key];
    }

    fn cmd_position(&mut self, args: &[&str]) {
        let mut idx = 0;
        let pos = match args.first() {
            Some(&"startpos") => {
                idx = 1;
                Some(Position::startpos())
            }
            Some(&"fen") => {
                let end = args
                    .iter()
                    .position(|&t| t == "moves")
                    .unwrap_or(args.len());
                idx = end;
                let fen = args[1..end].join(" ");
                match Position::from_fen(&fen) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!("bad fen: {e}");
                        None
                    }
                }
            }
            _ => {
                warn!("position needs startpos or fen");
                None
            }
        };
        let Some(mut pos) = pos else {
            return;
        };

        let mut keys = vec![pos.key];
        if args.get(idx) == Some(&"moves") {
            for tok in &args[idx + 1..] {
                match move_from_uci(&pos, tok) {
                    Some(m) => {
                        pos.apply_move(m);
                        keys.push(pos.key);
                    }
                    None => {
                        warn!("illegal move in position command: {tok}");
                        break;
                    }
                }
            }
        }
        self.pos = pos;
        self.keys = keys;
    }

    fn cmd_go(&mut self, args: &[&str]) {
        if self.pool.is_searching() {
            warn!("go while already searching, ignored");
            return;
        }
        // 'go perft N' is a debugging alias
        if args.first() == Some(&"perft") {
            let depth = args
                .get(1)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(5);
            perft::perft_divide(&self.pos, depth);
            return;
        }

        let mut limits = Limits::default();
        let mut i = 0;
        while i < args.len() {
            let val = args.get(i + 1);
            let num = || val.and_then(|s| s.parse::<u64>().ok());
            let mut took_value = true;
            match args[i] {
                "wtime" => limits.wtime = num(),
                "btime" => limits.btime = num(),
                "winc" => limits.winc = num(),
                "binc" => limits.binc = num(),
                "movestogo" => limits.movestogo = num(),
                "movetime" => limits.movetime = num(),
                "nodes" => limits.nodes = num(),
                "depth" => limits.depth = val.and_then(|s| s.parse::<i32>().ok()),
                "infinite" => {
                    limits.infinite = true;
                    took_value = false;
                }
                _ => took_value = false,
            }
            i += if took_value { 2 } else { 1 };
        }

        self.pool
            .start_search(self.pos, &self.keys, limits, self.move_overhead);
    }

    fn cmd_eval(&mut self) {
        let mut accs = crate::eval::nnue::AccumulatorStack::new();
        accs.reset(&self.pos, &self.net);
        let score = crate::eval::evaluate(&self.pos, &self.net, &mut accs);
        println!("static eval: {score} cp (side to move)");
    }
}

impl Default for Uci {
    fn default() -> Self {
        Uci::new()
    }
}

/// Debug board printout for the `d` command.
fn print_board(p: &Position) {
    for rank in (0..8).rev() {
        let mut row = String::new();
        for file in 0..8 {
            let sq = crate::types::Square::new(file, rank);
            let ch = match (p.piece_type_on(sq), p.color_on(sq)) {
                (Some(pt), Some(c)) => pt.to_char(c),
                _ => '.',
            };
            row.push(ch);
            row.push(' ');
        }
        println!("{row}");
    }
    println!("fen: {}", p.to_fen());
    println!("key: {:016x}", p.key);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_command_tracks_game_keys() {
        let mut uci = Uci::new();
        uci.cmd_position(&["startpos", "moves", "e2e4", "e7e5", "g1f3"]);
        assert_eq!(uci.keys.len(), 4);
        assert_eq!(*uci.keys.last().unwrap(), uci.pos.key);

        let expected = Position::from_fen(
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2",
        )
        .unwrap();
        assert_eq!(uci.pos.key, expected.key);
    }

    #[test]
    fn position_fen_with_moves() {
        let mut uci = Uci::new();
        uci.cmd_position(&[
            "fen", "4k3/8/8/8/8/8/4P3/4K3", "w", "-", "-", "0", "1", "moves", "e2e4",
        ]);
        assert_eq!(uci.pos.ep_square, None);
        assert_eq!(uci.keys.len(), 2);
    }

    #[test]
    fn illegal_move_stops_parsing_but_keeps_prefix() {
        let mut uci = Uci::new();
        uci.cmd_position(&["startpos", "moves", "e2e4", "e2e4"]);
        assert_eq!(uci.keys.len(), 2);
    }
}
