//! Signal invariant checks

use crate::strategy::{Direction, Signal};

/// Signal validator
pub struct SignalValidator;

impl SignalValidator {
    /// Confidence in [0, 1] and stop/target straddling entry per direction
    pub fn validate(signal: &Signal) -> bool {
        let levels_ok = match signal.direction {
            Direction::Long => {
                signal.stop_loss < signal.entry_price && signal.entry_price < signal.take_profit
            }
            Direction::Short => {
                signal.take_profit < signal.entry_price && signal.entry_price < signal.stop_loss
            }
        };
        levels_ok
            && (0.0..=1.0).contains(&signal.confidence)
            && signal.position_size.is_finite()
            && signal.position_size > 0.0
    }
}
