//! Strategy engine module
//!
//! Turns a confluence assessment into a directional signal candidate.

pub mod generator;
pub mod signal;
pub mod validator;

pub use generator::*;
pub use signal::*;
pub use validator::*;
