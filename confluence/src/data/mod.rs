//! Data management module
//!
//! Bars, timeframes, the instrument catalog and the data-provider seam.

pub mod bar;
pub mod instrument;
pub mod provider;
pub mod storage;
pub mod synthetic;
pub mod timeframe;

pub use bar::*;
pub use instrument::*;
pub use provider::*;
pub use storage::*;
pub use synthetic::*;
pub use timeframe::*;
