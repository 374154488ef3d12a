//! Configuration module
//!
//! Read-only configuration surface consumed by the pipeline. Loading it from
//! files or the environment is the host's job.

pub mod risk;
pub mod scan;

pub use risk::*;
pub use scan::*;
