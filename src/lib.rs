//! UCI chess engine: bitboard move generation, NNUE evaluation and a
//! lazy-SMP alpha-beta search.

pub mod bench;
pub mod board;
pub mod eval;
pub mod movegen;
pub mod perft;
pub mod search;
pub mod types;
pub mod uci;
