//! Scan configuration

use std::collections::HashSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::data::Timeframe;
use crate::indicators::DEFAULT_RSI_PERIOD;
use crate::error::{Result, SignalError};

/// One configured timeframe with its vote weight and swing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSetting {
    pub timeframe: Timeframe,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_lookback")]
    pub swing_lookback: usize,
}

fn default_weight() -> f64 {
    1.0
}

fn default_lookback() -> usize {
    50
}

impl TimeframeSetting {
    pub fn new(timeframe: Timeframe, weight: f64, swing_lookback: usize) -> Self {
        Self {
            timeframe,
            weight,
            swing_lookback,
        }
    }
}

/// Confidence tuning coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Share of confidence driven by RSI extremity (0 = agreement only)
    pub extremity_blend: f64,
    /// Multiplier applied when a contributing swing is degenerate
    pub low_quality_penalty: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            extremity_blend: 0.5,
            low_quality_penalty: 0.5,
        }
    }
}

/// Duplicate suppression thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Confidence change below this is the same confluence state
    pub confidence_delta: f64,
    /// Entry moves within this percent are the same confluence state
    pub entry_tolerance_pct: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            confidence_delta: 0.05,
            entry_tolerance_pct: 0.25,
        }
    }
}

/// Longest RSI period accepted by validation
pub const MAX_RSI_PERIOD: usize = 10_000;

/// Longest swing lookback accepted by validation
pub const MAX_SWING_LOOKBACK: usize = 100_000;

/// Longest signal time-to-live accepted by validation (one year)
pub const MAX_SIGNAL_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Ordered timeframes with weights, shortest first after validation
    pub timeframes: Vec<TimeframeSetting>,
    /// "Near a level" band, percent of price
    pub fib_tolerance_pct: f64,
    pub min_agreement_threshold: f64,
    pub min_confidence_floor: f64,
    pub signal_ttl_secs: i64,
    pub confidence: ConfidenceConfig,
    pub dedup: DedupConfig,
    pub risk: RiskConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rsi_period: DEFAULT_RSI_PERIOD,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            timeframes: vec![
                TimeframeSetting::new(Timeframe::H1, 1.0, 50),
                TimeframeSetting::new(Timeframe::H4, 1.5, 50),
                TimeframeSetting::new(Timeframe::D1, 2.0, 30),
            ],
            fib_tolerance_pct: 0.5,
            min_agreement_threshold: 0.6,
            min_confidence_floor: 0.3,
            signal_ttl_secs: 24 * 60 * 60,
            confidence: ConfidenceConfig::default(),
            dedup: DedupConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: ScanConfig = serde_json::from_str(json)
            .map_err(|e| SignalError::InvalidConfig(format!("malformed scan config: {e}")))?;
        config.timeframes.sort_by_key(|s| s.timeframe);
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and uniqueness
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(SignalError::InvalidConfig(msg)) };

        if self.timeframes.is_empty() {
            return invalid("at least one timeframe is required".to_string());
        }
        let mut seen = HashSet::new();
        for setting in &self.timeframes {
            if !seen.insert(setting.timeframe) {
                return invalid(format!("duplicate timeframe {}", setting.timeframe));
            }
            if !setting.weight.is_finite() || setting.weight <= 0.0 {
                return invalid(format!(
                    "weight for {} must be positive, got {}",
                    setting.timeframe, setting.weight
                ));
            }
            if !(2..=MAX_SWING_LOOKBACK).contains(&setting.swing_lookback) {
                return invalid(format!(
                    "swing_lookback for {} must be within [2, {MAX_SWING_LOOKBACK}], got {}",
                    setting.timeframe, setting.swing_lookback
                ));
            }
        }
        if !(1..=MAX_RSI_PERIOD).contains(&self.rsi_period) {
            return invalid(format!(
                "rsi_period must be within [1, {MAX_RSI_PERIOD}], got {}",
                self.rsi_period
            ));
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return invalid(format!(
                "rsi bands must satisfy 0 <= oversold < overbought <= 100, got {}/{}",
                self.rsi_oversold, self.rsi_overbought
            ));
        }
        for (name, value) in [
            ("min_agreement_threshold", self.min_agreement_threshold),
            ("min_confidence_floor", self.min_confidence_floor),
            ("confidence.extremity_blend", self.confidence.extremity_blend),
            ("confidence.low_quality_penalty", self.confidence.low_quality_penalty),
            ("dedup.confidence_delta", self.dedup.confidence_delta),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        if self.fib_tolerance_pct < 0.0 || self.dedup.entry_tolerance_pct < 0.0 {
            return invalid("tolerances must not be negative".to_string());
        }
        let risk = &self.risk;
        if !risk.fallback_stop_pct.is_finite()
            || risk.fallback_stop_pct <= 0.0
            || risk.fallback_stop_pct >= 100.0
            || risk.min_stop_distance_pct < 0.0
            || risk.max_stop_distance_pct < risk.min_stop_distance_pct
            || risk.max_stop_distance_pct >= 100.0
        {
            return invalid(format!(
                "stop distances must satisfy 0 < fallback < 100 and 0 <= min <= max < 100, got {}/{}/{}",
                risk.fallback_stop_pct, risk.min_stop_distance_pct, risk.max_stop_distance_pct
            ));
        }
        if !(1..=MAX_SIGNAL_TTL_SECS).contains(&self.signal_ttl_secs) {
            return invalid(format!(
                "signal_ttl_secs must be within [1, {MAX_SIGNAL_TTL_SECS}], got {}",
                self.signal_ttl_secs
            ));
        }
        Ok(())
    }

    /// Signal time-to-live, clamped to the accepted range
    pub fn signal_ttl(&self) -> Duration {
        Duration::try_seconds(self.signal_ttl_secs.clamp(1, MAX_SIGNAL_TTL_SECS))
            .unwrap_or_else(|| Duration::hours(24))
    }

    /// Bars to request for a timeframe: enough for both RSI and swing detection
    pub fn bars_needed(&self, setting: &TimeframeSetting) -> usize {
        setting.swing_lookback.max(self.rsi_period.saturating_add(1))
    }
}
