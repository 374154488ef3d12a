//! Swing high/low detection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Bar;
use crate::error::{Result, SignalError};

/// Direction of the move between the two extremes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingDirection {
    /// Low came first, the move ran up into the high
    Up,
    /// High came first, the move ran down into the low
    Down,
}

/// Most recent significant high/low pair, the Fibonacci anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub high: f64,
    pub low: f64,
    pub high_time: DateTime<Utc>,
    pub low_time: DateTime<Utc>,
    pub direction: SwingDirection,
}

impl SwingPoint {
    /// Extreme the move started from
    pub fn start(&self) -> f64 {
        match self.direction {
            SwingDirection::Up => self.low,
            SwingDirection::Down => self.high,
        }
    }

    /// Extreme the move ended at
    pub fn end(&self) -> f64 {
        match self.direction {
            SwingDirection::Up => self.high,
            SwingDirection::Down => self.low,
        }
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// High equals low: no usable retracement
    pub fn is_degenerate(&self) -> bool {
        self.range() <= 0.0
    }
}

/// Highest high and lowest low over the last `lookback` bars.
///
/// The later extreme decides the direction; when both sit on the same bar the
/// bar's own body breaks the tie.
pub fn detect_swing(bars: &[Bar], lookback: usize) -> Result<SwingPoint> {
    let lookback = lookback.max(1);
    if bars.len() < lookback {
        return Err(SignalError::InsufficientData {
            needed: lookback,
            got: bars.len(),
        });
    }

    let window = &bars[bars.len() - lookback..];
    let mut high_bar = &window[0];
    let mut low_bar = &window[0];
    for bar in &window[1..] {
        if bar.high > high_bar.high {
            high_bar = bar;
        }
        if bar.low < low_bar.low {
            low_bar = bar;
        }
    }

    let direction = match low_bar.timestamp.cmp(&high_bar.timestamp) {
        std::cmp::Ordering::Less => SwingDirection::Up,
        std::cmp::Ordering::Greater => SwingDirection::Down,
        std::cmp::Ordering::Equal if high_bar.is_bullish() => SwingDirection::Up,
        std::cmp::Ordering::Equal => SwingDirection::Down,
    };

    Ok(SwingPoint {
        high: high_bar.high,
        low: low_bar.low,
        high_time: high_bar.timestamp,
        low_time: low_bar.timestamp,
        direction,
    })
}
