//! OHLCV bar data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

/// OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check if bar is bullish
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Get total range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Finite OHLC with a non-negative range
    fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
            && self.range() >= 0.0
    }
}

impl ta::Open for Bar {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for Bar {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Bar {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Bar {
    fn close(&self) -> f64 {
        self.close
    }
}

impl ta::Volume for Bar {
    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Ordered bar sequence for one (instrument, timeframe)
///
/// Timestamps are strictly increasing and every price is finite with
/// high >= low; a series is immutable once built.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, rejecting unordered or duplicate timestamps and
    /// malformed prices
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if let Some(pos) = bars.iter().position(|b| !b.is_well_formed()) {
            return Err(SignalError::InvalidBars(format!(
                "bar at {} has non-finite or inverted prices",
                bars[pos].timestamp
            )));
        }
        if let Some(pos) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SignalError::InvalidBars(format!(
                "timestamp at index {} is not after {}",
                pos + 1,
                bars[pos].timestamp
            )));
        }
        Ok(Self { bars })
    }

    /// Get number of bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get last bar
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Get all bars
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Latest close price
    pub fn last_close(&self) -> Option<f64> {
        self.last().map(|b| b.close)
    }
}
