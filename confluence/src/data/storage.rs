//! In-memory bar store, the "live" provider variant
//!
//! An external collaborator (HTTP client, stream aggregator) pushes bars in;
//! the pipeline reads them through `MarketDataProvider`.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::data::{normalize_symbol, Bar, BarSeries, MarketDataProvider, Timeframe};
use crate::error::{Result, SignalError};

/// In-memory bar storage keyed by instrument and timeframe
#[derive(Debug, Default)]
pub struct BarStore {
    bars: RwLock<HashMap<(String, Timeframe), Vec<Bar>>>,
    prices: RwLock<HashMap<String, f64>>,
}

impl BarStore {
    /// Create new storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bar; bars at or before the stored tail are dropped
    pub fn add_bar(&self, instrument: &str, timeframe: Timeframe, bar: Bar) -> bool {
        let key = (normalize_symbol(instrument), timeframe);
        let mut bars = self.bars.write();
        let series = bars.entry(key).or_default();
        if series.last().is_some_and(|last| bar.timestamp <= last.timestamp) {
            return false;
        }
        series.push(bar);
        true
    }

    /// Add multiple bars, returning how many were accepted
    pub fn add_bars(&self, instrument: &str, timeframe: Timeframe, bars: Vec<Bar>) -> usize {
        bars.into_iter()
            .filter(|bar| self.add_bar(instrument, timeframe, bar.clone()))
            .count()
    }

    /// Record the latest traded price
    pub fn set_price(&self, instrument: &str, price: f64) {
        self.prices.write().insert(normalize_symbol(instrument), price);
    }

    /// Get number of stored bars
    pub fn len(&self) -> usize {
        self.bars.read().values().map(|v| v.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarketDataProvider for BarStore {
    fn name(&self) -> &str {
        "store"
    }

    fn bars(&self, instrument: &str, timeframe: Timeframe, count: usize) -> Result<BarSeries> {
        let key = (normalize_symbol(instrument), timeframe);
        let bars = self.bars.read();
        match bars.get(&key) {
            Some(series) if !series.is_empty() => {
                let start = series.len().saturating_sub(count);
                BarSeries::new(series[start..].to_vec())
            }
            _ => Err(SignalError::DataUnavailable {
                instrument: key.0,
                timeframe,
                reason: "no bars stored".to_string(),
            }),
        }
    }

    fn latest_price(&self, instrument: &str) -> Result<f64> {
        let symbol = normalize_symbol(instrument);
        if let Some(price) = self.prices.read().get(&symbol) {
            return Ok(*price);
        }

        // No tick recorded: fall back to the freshest close of the shortest timeframe
        let bars = self.bars.read();
        bars.iter()
            .filter(|((s, _), v)| *s == symbol && !v.is_empty())
            .min_by_key(|((_, tf), _)| *tf)
            .and_then(|(_, v)| v.last())
            .map(|bar| bar.close)
            .ok_or_else(|| SignalError::DataUnavailable {
                instrument: symbol.clone(),
                timeframe: Timeframe::H1,
                reason: "no price recorded".to_string(),
            })
    }
}
