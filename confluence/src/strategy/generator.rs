//! Confluence assessment to signal candidate

use tracing::debug;

use crate::analysis::{ConfluenceAssessment, TimeframeReading};
use crate::config::ScanConfig;
use crate::strategy::{LevelTouch, Rationale, SignalCandidate};

/// Turns a confluence assessment into a directional candidate
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: ScanConfig,
}

impl SignalGenerator {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Candidate for the majority direction, or `None` when the assessment is
    /// neutral, below the agreement threshold or below the confidence floor
    pub fn generate(&self, assessment: &ConfluenceAssessment) -> Option<SignalCandidate> {
        let direction = assessment.majority.direction()?;
        if assessment.agreement_score < self.config.min_agreement_threshold {
            debug!(
                instrument = %assessment.instrument,
                agreement = assessment.agreement_score,
                "agreement below threshold"
            );
            return None;
        }

        let confidence = self.confidence(assessment);
        if confidence < self.config.min_confidence_floor {
            debug!(
                instrument = %assessment.instrument,
                confidence,
                "confidence below floor"
            );
            return None;
        }

        Some(SignalCandidate {
            instrument: assessment.instrument.clone(),
            direction,
            confidence,
            entry_price: assessment.entry_price(),
            rationale: rationale(assessment),
        })
    }

    /// Agreement scaled by mean RSI extremity of the contributing timeframes,
    /// penalized when any contributing swing is degenerate
    pub fn confidence(&self, assessment: &ConfluenceAssessment) -> f64 {
        let contributing: Vec<&TimeframeReading> = assessment.contributing().collect();
        if contributing.is_empty() {
            return 0.0;
        }

        let extremity = contributing
            .iter()
            .map(|r| r.rsi.extremity())
            .sum::<f64>()
            / contributing.len() as f64;
        let blend = self.config.confidence.extremity_blend;
        let mut confidence = assessment.agreement_score * ((1.0 - blend) + blend * extremity);

        if contributing.iter().any(|r| r.fib.is_degenerate()) {
            confidence *= self.config.confidence.low_quality_penalty;
        }
        confidence.clamp(0.0, 1.0)
    }
}

fn rationale(assessment: &ConfluenceAssessment) -> Rationale {
    let contributing: Vec<&TimeframeReading> = assessment.contributing().collect();
    // shortest contributing timeframe sitting on a level
    let nearest_level = contributing.iter().find_map(|r| {
        r.touched.map(|level| LevelTouch {
            timeframe: r.timeframe,
            ratio: level.ratio,
            price: level.price,
        })
    });

    Rationale {
        agreeing: contributing.iter().map(|r| r.timeframe).collect(),
        rsi: assessment.readings.iter().map(|r| r.rsi).collect(),
        nearest_level,
        agreement_score: assessment.agreement_score,
        low_quality: contributing.iter().any(|r| r.fib.is_degenerate()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::fixtures::{assessment, reading};
    use crate::analysis::Bias;
    use crate::data::Timeframe;
    use crate::indicators::SwingDirection;
    use crate::strategy::Direction;

    fn generator() -> SignalGenerator {
        SignalGenerator::new(ScanConfig::default())
    }

    #[test]
    fn test_unanimous_oversold_generates_long() {
        let a = assessment(vec![
            reading(Timeframe::H1, 20.0, (1900.0, 2000.0), SwingDirection::Up, 1962.0, Bias::Long),
            reading(Timeframe::H4, 20.0, (1850.0, 2000.0), SwingDirection::Up, 1962.0, Bias::Long),
        ]);
        let candidate = generator().generate(&a).unwrap();

        assert_eq!(candidate.direction, Direction::Long);
        assert_eq!(candidate.entry_price, 1962.0);
        // 1.0 * (0.5 + 0.5 * 0.6)
        assert!((candidate.confidence - 0.8).abs() < 1e-9);
        assert_eq!(candidate.rationale.agreeing, vec![Timeframe::H1, Timeframe::H4]);
        let level = candidate.rationale.nearest_level.unwrap();
        assert_eq!(level.timeframe, Timeframe::H1);
        assert_eq!(level.ratio, 0.618);
        assert!(!candidate.rationale.low_quality);
    }

    #[test]
    fn test_degenerate_swing_halves_confidence() {
        let a = assessment(vec![reading(
            Timeframe::H1,
            20.0,
            (1950.0, 1950.0),
            SwingDirection::Up,
            1950.0,
            Bias::Long,
        )]);
        let candidate = generator().generate(&a).unwrap();
        assert!((candidate.confidence - 0.4).abs() < 1e-9);
        assert!(candidate.rationale.low_quality);
        assert!(candidate.rationale.nearest_level.is_none());
    }

    #[test]
    fn test_below_threshold_is_no_signal() {
        // two neutral timeframes outvote one long
        let a = assessment(vec![
            reading(Timeframe::H1, 20.0, (1900.0, 2000.0), SwingDirection::Up, 1990.0, Bias::Long),
            reading(Timeframe::H4, 50.0, (1900.0, 2000.0), SwingDirection::Up, 1990.0, Bias::Neutral),
            reading(Timeframe::D1, 50.0, (1900.0, 2000.0), SwingDirection::Up, 1990.0, Bias::Neutral),
        ]);
        assert_eq!(a.majority, Bias::Neutral);
        assert!(generator().generate(&a).is_none());

        let a = assessment(vec![
            reading(Timeframe::H1, 20.0, (1900.0, 2000.0), SwingDirection::Up, 1990.0, Bias::Long),
            reading(Timeframe::H4, 20.0, (1900.0, 2000.0), SwingDirection::Up, 1990.0, Bias::Long),
            reading(Timeframe::D1, 80.0, (1900.0, 2000.0), SwingDirection::Up, 1990.0, Bias::Short),
        ]);
        let mut config = ScanConfig::default();
        config.min_agreement_threshold = 0.7;
        assert!(SignalGenerator::new(config).generate(&a).is_none());
    }

    #[test]
    fn test_below_confidence_floor_is_no_signal() {
        // touched support with neutral RSI: extremity 0.04, plus degenerate H4 swing
        let a = assessment(vec![
            reading(Timeframe::H1, 48.0, (1900.0, 2000.0), SwingDirection::Up, 1962.0, Bias::Long),
            reading(Timeframe::H4, 48.0, (1962.0, 1962.0), SwingDirection::Up, 1962.0, Bias::Long),
        ]);
        let generator = generator();
        // 1.0 * (0.5 + 0.5 * 0.04) * 0.5 = 0.26
        assert!((generator.confidence(&a) - 0.26).abs() < 1e-9);
        assert!(generator.generate(&a).is_none());
    }

    #[test]
    fn test_confidence_stays_in_unit_interval() {
        let a = assessment(vec![reading(
            Timeframe::H1,
            100.0,
            (1900.0, 2000.0),
            SwingDirection::Down,
            1938.2,
            Bias::Short,
        )]);
        let mut config = ScanConfig::default();
        config.confidence.extremity_blend = 1.0;
        let confidence = SignalGenerator::new(config).confidence(&a);
        assert!((0.0..=1.0).contains(&confidence));
        assert_eq!(confidence, 1.0);
    }
}
