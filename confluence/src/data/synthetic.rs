//! Synthetic fallback provider
//!
//! Deterministic random-walk bars for demonstration when no live feed is
//! configured. Same (instrument, timeframe, anchor) always yields the same
//! series, so scan cycles over it are reproducible.

use chrono::{DateTime, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::{normalize_symbol, Bar, BarSeries, MarketDataProvider, Timeframe};
use crate::error::{Result, SignalError};

const DEFAULT_HISTORY: usize = 500;

/// Fallback provider generating seeded random-walk bars
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    anchor: DateTime<Utc>,
    history: usize,
}

impl SyntheticProvider {
    /// Create a provider whose newest bar opens at or before `anchor`
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            history: DEFAULT_HISTORY,
        }
    }

    fn base_price(symbol: &str) -> f64 {
        match symbol {
            "XAUUSD" => 1900.0,
            "EURUSD" => 1.08,
            "GBPUSD" => 1.26,
            _ => 100.0,
        }
    }

    fn seed(symbol: &str, timeframe: Timeframe) -> u64 {
        // FNV-1a over symbol and timeframe label
        symbol
            .bytes()
            .chain(timeframe.label().bytes())
            .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
                (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
            })
    }

    fn generate(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Result<Vec<Bar>> {
        let step = timeframe.duration();
        let last_open = self.anchor.duration_trunc(step).map_err(|e| {
            SignalError::DataUnavailable {
                instrument: symbol.to_string(),
                timeframe,
                reason: format!("cannot align anchor: {e}"),
            }
        })?;

        let len = self.history.max(count);
        let mut rng = StdRng::seed_from_u64(Self::seed(symbol, timeframe));
        let hours = step.num_minutes() as f64 / 60.0;
        let sigma = Self::base_price(symbol) * 0.002 * hours.sqrt();

        let mut close = Self::base_price(symbol);
        let mut bars = Vec::with_capacity(len);
        for i in 0..len {
            let open = close;
            close = (open + rng.gen_range(-1.0..1.0) * sigma).max(sigma);
            let high = open.max(close) + rng.gen_range(0.0..0.5) * sigma;
            let low = (open.min(close) - rng.gen_range(0.0..0.5) * sigma).max(0.0);
            let timestamp = last_open - step * (len - 1 - i) as i32;
            bars.push(Bar::new(timestamp, open, high, low, close, rng.gen_range(100.0..1000.0)));
        }

        Ok(bars.split_off(len - count.min(len)))
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    fn bars(&self, instrument: &str, timeframe: Timeframe, count: usize) -> Result<BarSeries> {
        let symbol = normalize_symbol(instrument);
        BarSeries::new(self.generate(&symbol, timeframe, count)?)
    }

    fn latest_price(&self, instrument: &str) -> Result<f64> {
        let symbol = normalize_symbol(instrument);
        self.generate(&symbol, Timeframe::H1, 1)?
            .last()
            .map(|bar| bar.close)
            .ok_or(SignalError::DataUnavailable {
                instrument: symbol,
                timeframe: Timeframe::H1,
                reason: "empty synthetic series".to_string(),
            })
    }
}
