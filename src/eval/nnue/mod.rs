//! Incrementally updated neural evaluator.

pub mod accumulator;
pub mod network;

pub use accumulator::{AccumulatorStack, DirtyPieces};
pub use network::Network;
