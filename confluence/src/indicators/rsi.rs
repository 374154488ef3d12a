//! RSI (Relative Strength Index) indicator with Wilder smoothing

use serde::{Deserialize, Serialize};
use ta::{Next, Period, Reset};

use crate::data::{Bar, Timeframe};
use crate::error::{Result, SignalError};

/// Default RSI period
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// RSI value computed for one timeframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub timeframe: Timeframe,
    /// Always within [0, 100]
    pub value: f64,
    pub period: usize,
}

impl RsiReading {
    /// Distance from 50 normalized to [0, 1]
    pub fn extremity(&self) -> f64 {
        ((self.value - 50.0).abs() / 50.0).clamp(0.0, 1.0)
    }
}

/// Streaming Wilder RSI
///
/// The first average is the simple mean of the first `period` deltas; every
/// later average is `(prior * (period - 1) + current) / period`.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    deltas: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl Rsi {
    /// Create new RSI indicator
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(SignalError::InvalidConfig(
                "RSI period must be positive".to_string(),
            ));
        }
        Ok(Self {
            period,
            prev_close: None,
            deltas: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        })
    }

    /// Check if indicator has seen `period + 1` closes
    pub fn is_ready(&self) -> bool {
        self.deltas >= self.period
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 {
            // flat market is neutral, pure gains saturate
            if self.avg_gain == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            let rs = self.avg_gain / self.avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        }
    }
}

impl Next<f64> for Rsi {
    type Output = Option<f64>;

    fn next(&mut self, close: f64) -> Self::Output {
        let prev = match self.prev_close.replace(close) {
            Some(prev) => prev,
            None => return None,
        };

        let delta = close - prev;
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        let n = self.period as f64;

        self.deltas += 1;
        if self.deltas <= self.period {
            // seed phase accumulates sums, divided once the window fills
            self.avg_gain += gain;
            self.avg_loss += loss;
            if self.deltas < self.period {
                return None;
            }
            self.avg_gain /= n;
            self.avg_loss /= n;
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        Some(self.value())
    }
}

impl Period for Rsi {
    fn period(&self) -> usize {
        self.period
    }
}

impl Reset for Rsi {
    fn reset(&mut self) {
        self.prev_close = None;
        self.deltas = 0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
    }
}

/// RSI over the whole bar window for one timeframe.
///
/// Fails with `InsufficientData` when fewer than `period + 1` bars are given.
pub fn rsi(bars: &[Bar], period: usize, timeframe: Timeframe) -> Result<RsiReading> {
    let needed = period.saturating_add(1);
    if bars.len() < needed {
        return Err(SignalError::InsufficientData {
            needed,
            got: bars.len(),
        });
    }

    let mut indicator = Rsi::new(period)?;
    let value = bars
        .iter()
        .fold(None, |_, bar| indicator.next(bar.close))
        .ok_or(SignalError::InsufficientData {
            needed,
            got: bars.len(),
        })?;

    Ok(RsiReading {
        timeframe,
        value,
        period,
    })
}
