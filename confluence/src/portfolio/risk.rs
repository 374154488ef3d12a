//! Risk management

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::TimeframeReading;
use crate::config::{RiskConfig, RiskParameters};
use crate::data::Timeframe;
use crate::error::{Result, SignalError};
use crate::strategy::Direction;

/// Where the stop-loss came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopSource {
    FibonacciLevel { timeframe: Timeframe, ratio: f64 },
    FixedPercent,
}

/// Stop, target and size for one signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPlan {
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Units of the instrument
    pub position_size: f64,
    pub risk_reward: f64,
    /// Position value as fraction of equity
    pub position_fraction: f64,
    pub stop_source: StopSource,
}

/// Risk manager
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    /// Create new risk manager
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Full plan for a signal at `entry`, stops drawn from the readings' levels
    pub fn plan(
        &self,
        direction: Direction,
        entry: f64,
        readings: &[TimeframeReading],
        params: &RiskParameters,
    ) -> Result<RiskPlan> {
        params.validate()?;
        if !entry.is_finite() || entry <= 0.0 {
            return Err(SignalError::InvalidRiskParameters(format!(
                "entry price must be positive, got {entry}"
            )));
        }

        let (stop_loss, stop_source) = self.place_stop(direction, entry, readings);
        let position_size = Self::calculate_position_size(entry, stop_loss, params)?;
        let take_profit = take_profit(direction, entry, stop_loss, params.reward_risk_ratio);

        debug!(
            %direction,
            entry,
            stop_loss,
            take_profit,
            position_size,
            source = ?stop_source,
            "risk plan"
        );

        Ok(RiskPlan {
            stop_loss,
            take_profit,
            position_size,
            risk_reward: (take_profit - entry).abs() / (entry - stop_loss).abs(),
            position_fraction: position_size * entry / params.account_equity,
            stop_source,
        })
    }

    /// Nearest Fibonacci level on the adverse side whose distance from entry
    /// lies within the configured band, else the fixed-percent fallback.
    ///
    /// Degenerate swings never provide a stop.
    pub fn place_stop(
        &self,
        direction: Direction,
        entry: f64,
        readings: &[TimeframeReading],
    ) -> (f64, StopSource) {
        let min_distance = entry * self.config.min_stop_distance_pct / 100.0;
        let max_distance = entry * self.config.max_stop_distance_pct / 100.0;

        let nearest = readings
            .iter()
            .filter(|r| !r.fib.is_degenerate())
            .flat_map(|r| r.fib.levels.iter().map(move |l| (r.timeframe, *l)))
            .filter_map(|(timeframe, level)| {
                let distance = match direction {
                    Direction::Long => entry - level.price,
                    Direction::Short => level.price - entry,
                };
                (distance > 0.0 && distance >= min_distance && distance <= max_distance)
                    .then_some((distance, timeframe, level))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match nearest {
            Some((_, timeframe, level)) => (
                level.price,
                StopSource::FibonacciLevel {
                    timeframe,
                    ratio: level.ratio,
                },
            ),
            None => {
                let offset = entry * self.config.fallback_stop_pct / 100.0;
                let stop = match direction {
                    Direction::Long => entry - offset,
                    Direction::Short => entry + offset,
                };
                (stop, StopSource::FixedPercent)
            }
        }
    }

    /// Size risking `risk_per_trade_fraction` of equity, capped so position
    /// value stays within `max_position_fraction` of equity
    pub fn calculate_position_size(
        entry_price: f64,
        stop_loss: f64,
        params: &RiskParameters,
    ) -> Result<f64> {
        params.validate()?;
        let price_risk = (entry_price - stop_loss).abs();
        if !price_risk.is_finite() || price_risk == 0.0 {
            return Err(SignalError::DegenerateStop {
                entry: entry_price,
                stop: stop_loss,
            });
        }

        let risk_amount = params.account_equity * params.risk_per_trade_fraction;
        let quantity = risk_amount / price_risk;
        let max_quantity = (params.account_equity * params.max_position_fraction) / entry_price;

        Ok(quantity.min(max_quantity))
    }
}

/// Target at `ratio` times the stop distance on the favourable side
pub fn take_profit(direction: Direction, entry: f64, stop: f64, ratio: f64) -> f64 {
    let reward = (entry - stop).abs() * ratio;
    match direction {
        Direction::Long => entry + reward,
        Direction::Short => entry - reward,
    }
}
