//! Fibonacci retracement levels

use serde::{Deserialize, Serialize};

use crate::indicators::{SwingDirection, SwingPoint};

/// Fixed retracement ratios, ascending
pub const FIB_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

/// The golden-ratio level
pub const GOLDEN_RATIO: f64 = 0.618;

/// Quality flag propagated into confidence scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Normal,
    /// Degenerate swing (high == low), levels are flat
    LowSignalQuality,
}

/// How price is expected to react at the levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelRole {
    Support,
    Resistance,
}

/// One retracement level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

/// Retracement levels derived from a swing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub swing: SwingPoint,
    /// Ordered by ratio
    pub levels: Vec<FibLevel>,
    pub quality: SignalQuality,
}

impl FibonacciLevels {
    /// Build the fixed level set from a swing
    pub fn from_swing(swing: SwingPoint) -> Self {
        let levels = FIB_RATIOS
            .iter()
            .map(|&ratio| FibLevel {
                ratio,
                price: price_at(&swing, ratio),
            })
            .collect();
        let quality = if swing.is_degenerate() {
            SignalQuality::LowSignalQuality
        } else {
            SignalQuality::Normal
        };
        Self {
            swing,
            levels,
            quality,
        }
    }

    /// Price at an arbitrary ratio; 0.0 is the move's start, 1.0 its end
    pub fn price_at(&self, ratio: f64) -> f64 {
        price_at(&self.swing, ratio)
    }

    /// Price of one of the fixed levels
    pub fn level(&self, ratio: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| (l.ratio - ratio).abs() < 1e-9)
            .map(|l| l.price)
    }

    pub fn is_degenerate(&self) -> bool {
        self.quality == SignalQuality::LowSignalQuality
    }

    /// Levels of an up-move hold as support, of a down-move as resistance
    pub fn role(&self) -> LevelRole {
        match self.swing.direction {
            SwingDirection::Up => LevelRole::Support,
            SwingDirection::Down => LevelRole::Resistance,
        }
    }

    /// Level closest to `price`
    pub fn nearest(&self, price: f64) -> Option<FibLevel> {
        self.levels
            .iter()
            .copied()
            .min_by(|a, b| (a.price - price).abs().total_cmp(&(b.price - price).abs()))
    }

    /// Nearest level within `tolerance_pct` percent of `price`
    pub fn touched(&self, price: f64, tolerance_pct: f64) -> Option<FibLevel> {
        if self.is_degenerate() || price <= 0.0 {
            return None;
        }
        self.nearest(price)
            .filter(|l| (l.price - price).abs() / price * 100.0 <= tolerance_pct)
    }
}

fn price_at(swing: &SwingPoint, ratio: f64) -> f64 {
    match swing.direction {
        SwingDirection::Up => swing.low + swing.range() * ratio,
        SwingDirection::Down => swing.high - swing.range() * ratio,
    }
}
