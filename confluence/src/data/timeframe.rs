//! Bar timeframes

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Bar timeframe, ordered from shortest to longest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m", alias = "M15")]
    M15,
    #[serde(rename = "1h", alias = "1H", alias = "H1")]
    H1,
    #[serde(rename = "4h", alias = "4H", alias = "H4")]
    H4,
    #[serde(rename = "1d", alias = "1D", alias = "D1", alias = "daily")]
    D1,
    #[serde(rename = "1w", alias = "1W", alias = "W1", alias = "weekly")]
    W1,
}

impl Timeframe {
    /// Short label used in logs and serialized config
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }

    /// Length of one bar
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
            Timeframe::W1 => Duration::weeks(1),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "15m" | "m15" => Ok(Timeframe::M15),
            "1h" | "h1" | "60m" => Ok(Timeframe::H1),
            "4h" | "h4" => Ok(Timeframe::H4),
            "1d" | "d1" | "daily" => Ok(Timeframe::D1),
            "1w" | "w1" | "weekly" => Ok(Timeframe::W1),
            other => Err(SignalError::InvalidConfig(format!(
                "unknown timeframe: {other}"
            ))),
        }
    }
}
