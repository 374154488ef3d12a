//! Error taxonomy for the analysis-and-signal pipeline

use thiserror::Error;

use crate::data::Timeframe;

/// Errors produced by the confluence core
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// Not enough bars for a computation; retry next cycle with more history
    #[error("insufficient data: need {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Every configured timeframe was missing or unusable
    #[error("no usable data for {instrument}: every timeframe is missing")]
    NoUsableData { instrument: String },

    /// Reported by the data provider for one (instrument, timeframe)
    #[error("data unavailable for {instrument} {timeframe}: {reason}")]
    DataUnavailable {
        instrument: String,
        timeframe: Timeframe,
        reason: String,
    },

    /// Risk parameters are out of range
    #[error("invalid risk parameters: {0}")]
    InvalidRiskParameters(String),

    /// Entry and stop coincide, position size would divide by zero
    #[error("degenerate stop: entry {entry} equals stop {stop}")]
    DegenerateStop { entry: f64, stop: f64 },

    /// Bar sequence is unordered or carries malformed prices
    #[error("invalid bar series: {0}")]
    InvalidBars(String),

    /// Scan configuration is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SignalError {
    /// Risk-layer defects discard the signal instead of skipping the instrument
    pub fn is_fatal_for_signal(&self) -> bool {
        matches!(
            self,
            SignalError::InvalidRiskParameters(_) | SignalError::DegenerateStop { .. }
        )
    }

    /// Errors that only degrade one timeframe's contribution
    pub fn is_timeframe_local(&self) -> bool {
        matches!(
            self,
            SignalError::InsufficientData { .. }
                | SignalError::DataUnavailable { .. }
                | SignalError::InvalidBars(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SignalError>;
