//! Signal lifecycle: per-instrument state machine and the keyed store

pub mod book;
pub mod tracker;

pub use book::*;
pub use tracker::*;
