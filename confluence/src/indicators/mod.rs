//! Technical indicators module
//!
//! Stateless computations over bar windows: Wilder RSI, swing detection and
//! Fibonacci retracement levels.

pub mod fibonacci;
pub mod rsi;
pub mod swing;

pub use fibonacci::*;
pub use rsi::*;
pub use swing::*;
