//! Data-provider seam
//!
//! The core never fetches: a host picks one provider variant (live store or
//! synthetic fallback) and the pipeline only sees this trait.

use crate::data::{BarSeries, Timeframe};
use crate::error::Result;

/// Supplies ordered bars for (instrument, timeframe) requests
pub trait MarketDataProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// At least `count` most recent bars when available.
    ///
    /// Returns `SignalError::DataUnavailable` when nothing can be supplied;
    /// a shorter series is allowed and judged by the consumer.
    fn bars(&self, instrument: &str, timeframe: Timeframe, count: usize) -> Result<BarSeries>;

    /// Latest traded price, used to check stored stop/target levels
    fn latest_price(&self, instrument: &str) -> Result<f64>;
}
