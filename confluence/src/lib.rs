//! Confluence: multi-timeframe RSI + Fibonacci trading signals
//!
//! This crate fuses momentum and support/resistance readings across several
//! timeframes into confidence-scored signals with risk-managed position plans:
//! - [ta-rs](https://github.com/greyblake/ta-rs) traits for the indicator engine
//! - [tokio](https://tokio.rs) locks for the per-instrument signal store
//!
//! # Features
//!
//! - **Data**: bar series, instrument catalog, live store and synthetic fallback providers
//! - **Indicators**: Wilder RSI, swing detection, Fibonacci retracement levels
//! - **Analysis**: weighted timeframe voting, market snapshot, forex session
//! - **Strategy**: signal generation, confidence scoring, validation
//! - **Portfolio**: stop placement, take-profit, capped position sizing
//! - **Lifecycle**: supersession, expiry, exits and duplicate suppression
//!
//! # Example
//!
//! ```no_run
//! use confluence::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pipeline = SignalPipeline::new(ScanConfig::default())?;
//!     let provider = SyntheticProvider::new(chrono::Utc::now());
//!     let book = SignalBook::new();
//!     let params = pipeline.config().risk.parameters(10_000.0);
//!     if let Some(event) = pipeline
//!         .run_cycle("XAUUSD", &provider, &book, &params, chrono::Utc::now())
//!         .await?
//!     {
//!         println!("{:?} {}", event.status, event.signal.direction);
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod lifecycle;
pub mod pipeline;
pub mod portfolio;
pub mod strategy;

pub use error::{Result, SignalError};

// Re-export commonly used types
pub mod prelude {
    pub use crate::analysis::*;
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::indicators::*;
    pub use crate::lifecycle::*;
    pub use crate::pipeline::SignalPipeline;
    pub use crate::portfolio::*;
    pub use crate::strategy::*;

    pub use crate::error::{Result, SignalError};
}
