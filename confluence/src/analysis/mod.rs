//! Multi-timeframe analysis
//!
//! Per-timeframe readings merged into one confluence assessment, plus the
//! read-only market snapshot derived from it.

pub mod aggregator;
pub mod market;

pub use aggregator::*;
pub use market::*;
