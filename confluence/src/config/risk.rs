//! Risk management configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

/// Risk management configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Equity risked per trade (e.g., 0.02 = 2%)
    pub risk_per_trade_fraction: f64,
    /// Maximum position value as fraction of equity (e.g., 0.05 = 5%)
    pub max_position_fraction: f64,
    /// Target distance as a multiple of stop distance
    pub reward_risk_ratio: f64,
    /// Fixed stop distance in percent of entry when no Fibonacci level qualifies
    pub fallback_stop_pct: f64,
    /// Closest a Fibonacci stop may sit to entry, in percent
    pub min_stop_distance_pct: f64,
    /// Farthest a Fibonacci stop may sit from entry, in percent
    pub max_stop_distance_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade_fraction: 0.02,
            max_position_fraction: 0.05,
            reward_risk_ratio: 2.0,
            fallback_stop_pct: 1.5,
            min_stop_distance_pct: 0.1,
            max_stop_distance_pct: 3.0,
        }
    }
}

impl RiskConfig {
    /// Combine with externally supplied account equity
    pub fn parameters(&self, account_equity: f64) -> RiskParameters {
        RiskParameters {
            account_equity,
            risk_per_trade_fraction: self.risk_per_trade_fraction,
            max_position_fraction: self.max_position_fraction,
            reward_risk_ratio: self.reward_risk_ratio,
        }
    }
}

/// Account risk parameters, read-only to the core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub account_equity: f64,
    pub risk_per_trade_fraction: f64,
    pub max_position_fraction: f64,
    pub reward_risk_ratio: f64,
}

impl RiskParameters {
    /// Reject non-positive or non-finite parameters
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("account_equity", self.account_equity),
            ("risk_per_trade_fraction", self.risk_per_trade_fraction),
            ("max_position_fraction", self.max_position_fraction),
            ("reward_risk_ratio", self.reward_risk_ratio),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(SignalError::InvalidRiskParameters(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}
