//! Position planning

pub mod risk;

pub use risk::*;
