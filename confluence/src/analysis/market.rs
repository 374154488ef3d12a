//! Market snapshot and forex session state

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};

use crate::analysis::{Bias, ConfluenceAssessment};
use crate::data::Instrument;
use crate::indicators::{RsiReading, GOLDEN_RATIO};
use crate::strategy::{Direction, SignalCandidate};

/// Overall market lean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// What the snapshot suggests doing now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Buy,
    Sell,
    Wait,
}

/// On-demand technical snapshot of one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub instrument: String,
    pub current_price: f64,
    pub rsi: Vec<RsiReading>,
    /// Primary timeframe's 0.618 level, absent for a degenerate swing
    pub fib_618: Option<f64>,
    pub distance_to_618_pips: Option<f64>,
    pub sentiment: Sentiment,
    /// 0 (no conviction) to 10
    pub strength: u8,
    pub recommendation: Recommendation,
    pub agreement_score: f64,
}

/// Summarize an assessment; `candidate` is the generator's output for it
pub fn analyze(
    assessment: &ConfluenceAssessment,
    instrument: &Instrument,
    candidate: Option<&SignalCandidate>,
) -> MarketAnalysis {
    let primary = assessment.primary();
    let current_price = primary.last_close;
    let fib_618 = if primary.fib.is_degenerate() {
        None
    } else {
        primary.fib.level(GOLDEN_RATIO)
    };

    let sentiment = match assessment.majority {
        Bias::Long => Sentiment::Bullish,
        Bias::Short => Sentiment::Bearish,
        Bias::Neutral => Sentiment::Neutral,
    };
    let strength = match candidate {
        Some(c) => (c.confidence * 10.0).round() as u8,
        None if sentiment == Sentiment::Neutral => 0,
        None => (assessment.agreement_score * 5.0).round() as u8,
    };
    let recommendation = match candidate.map(|c| c.direction) {
        Some(Direction::Long) => Recommendation::Buy,
        Some(Direction::Short) => Recommendation::Sell,
        None => Recommendation::Wait,
    };

    MarketAnalysis {
        instrument: instrument.symbol.clone(),
        current_price,
        rsi: assessment.readings.iter().map(|r| r.rsi).collect(),
        fib_618,
        distance_to_618_pips: fib_618.map(|level| instrument.pips((current_price - level).abs())),
        sentiment,
        strength: strength.min(10),
        recommendation,
        agreement_score: assessment.agreement_score,
    }
}

/// Forex trading session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSession {
    Open,
    Closed,
}

/// Forex is closed from Friday 17:00 to Sunday 17:00 New York time
pub fn forex_session(now: DateTime<Utc>) -> MarketSession {
    let local = now.with_timezone(&New_York);
    let closed = match local.weekday() {
        Weekday::Fri => local.hour() >= 17,
        Weekday::Sat => true,
        Weekday::Sun => local.hour() < 17,
        _ => false,
    };
    if closed {
        MarketSession::Closed
    } else {
        MarketSession::Open
    }
}
