//! Signal records

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::Timeframe;
use crate::indicators::RsiReading;
use crate::portfolio::{RiskPlan, StopSource};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Buy/Long signal
    Long,
    /// Sell/Short signal
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("BUY"),
            Direction::Short => f.write_str("SELL"),
        }
    }
}

/// Lifecycle status of one signal instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Active,
    Superseded,
    Expired,
    Closed,
}

impl SignalStatus {
    /// Superseded, expired and closed never come back
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalStatus::Active)
    }
}

/// Which stored level the latest price crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

/// Fibonacci level that the entry price sits on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelTouch {
    pub timeframe: Timeframe,
    pub ratio: f64,
    pub price: f64,
}

/// Structured explanation of a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    /// Timeframes whose vote matched the signal direction
    pub agreeing: Vec<Timeframe>,
    /// RSI for every participating timeframe
    pub rsi: Vec<RsiReading>,
    pub nearest_level: Option<LevelTouch>,
    pub agreement_score: f64,
    /// A contributing swing was degenerate
    pub low_quality: bool,
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let agreeing: Vec<&str> = self.agreeing.iter().map(|tf| tf.label()).collect();
        write!(
            f,
            "{} agree ({:.0}%)",
            agreeing.join("/"),
            self.agreement_score * 100.0
        )?;
        for reading in &self.rsi {
            write!(f, ", RSI {} {:.2}", reading.timeframe, reading.value)?;
        }
        if let Some(level) = &self.nearest_level {
            write!(
                f,
                ", at Fib {:.3} ({}) {:.5}",
                level.ratio, level.timeframe, level.price
            )?;
        }
        if self.low_quality {
            f.write_str(", low swing quality")?;
        }
        Ok(())
    }
}

/// Directional signal before risk planning
#[derive(Debug, Clone, PartialEq)]
pub struct SignalCandidate {
    pub instrument: String,
    pub direction: Direction,
    /// Within [0, 1]
    pub confidence: f64,
    pub entry_price: f64,
    pub rationale: Rationale,
}

/// Trading signal owned by the lifecycle tracker
///
/// Immutable after creation except `status`, `exit` and `superseded_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub instrument: String,
    pub direction: Direction,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub risk_reward: f64,
    /// Position value as fraction of equity
    pub position_fraction: f64,
    pub stop_source: StopSource,
    pub created_at: DateTime<Utc>,
    pub status: SignalStatus,
    pub exit: Option<ExitReason>,
    pub superseded_by: Option<Uuid>,
    pub rationale: Rationale,
}

impl Signal {
    /// Assemble a fresh active signal from a candidate and its risk plan
    pub fn new(candidate: SignalCandidate, plan: RiskPlan, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: candidate.instrument,
            direction: candidate.direction,
            confidence: candidate.confidence,
            entry_price: candidate.entry_price,
            stop_loss: plan.stop_loss,
            take_profit: plan.take_profit,
            position_size: plan.position_size,
            risk_reward: plan.risk_reward,
            position_fraction: plan.position_fraction,
            stop_source: plan.stop_source,
            created_at,
            status: SignalStatus::Active,
            exit: None,
            superseded_by: None,
            rationale: candidate.rationale,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SignalStatus::Active
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Check the latest price against stored stop-loss and take-profit
    pub fn exit_hit(&self, price: f64) -> Option<ExitReason> {
        match self.direction {
            Direction::Long if price <= self.stop_loss => Some(ExitReason::StopLoss),
            Direction::Long if price >= self.take_profit => Some(ExitReason::TakeProfit),
            Direction::Short if price >= self.stop_loss => Some(ExitReason::StopLoss),
            Direction::Short if price <= self.take_profit => Some(ExitReason::TakeProfit),
            _ => None,
        }
    }
}
