//! Multi-timeframe aggregator

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ScanConfig, TimeframeSetting};
use crate::data::{BarSeries, MarketDataProvider, Timeframe};
use crate::error::{Result, SignalError};
use crate::indicators::{detect_swing, rsi, FibLevel, FibonacciLevels, LevelRole, RsiReading};
use crate::strategy::Direction;

/// Directional lean of one timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Long,
    Short,
    Neutral,
}

impl Bias {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Bias::Long => Some(Direction::Long),
            Bias::Short => Some(Direction::Short),
            Bias::Neutral => None,
        }
    }
}

/// Indicator readings and vote for one timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeReading {
    pub timeframe: Timeframe,
    pub weight: f64,
    pub rsi: RsiReading,
    pub fib: FibonacciLevels,
    pub last_close: f64,
    /// Level within tolerance of the last close, if any
    pub touched: Option<FibLevel>,
    pub vote: Bias,
}

/// Timeframe left out of voting and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedTimeframe {
    pub timeframe: Timeframe,
    pub reason: String,
}

/// Merged view across timeframes for one instrument and one scan cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceAssessment {
    pub instrument: String,
    /// Participating timeframes, shortest first
    pub readings: Vec<TimeframeReading>,
    pub excluded: Vec<ExcludedTimeframe>,
    pub majority: Bias,
    /// Weighted share of votes matching the majority, within [0, 1]
    pub agreement_score: f64,
}

impl ConfluenceAssessment {
    /// Shortest participating timeframe
    pub fn primary(&self) -> &TimeframeReading {
        &self.readings[0]
    }

    /// Latest close on the primary timeframe
    pub fn entry_price(&self) -> f64 {
        self.primary().last_close
    }

    /// Readings whose vote matches the majority
    pub fn contributing(&self) -> impl Iterator<Item = &TimeframeReading> + '_ {
        self.readings.iter().filter(move |r| r.vote == self.majority)
    }
}

/// Majority bias and its weighted share.
///
/// A tie for the largest share has no majority and scores zero.
pub fn score_votes(votes: &[(Bias, f64)]) -> (Bias, f64) {
    let total: f64 = votes.iter().map(|(_, w)| w).sum();
    if votes.is_empty() || total <= 0.0 {
        return (Bias::Neutral, 0.0);
    }

    let tally = |bias: Bias| -> f64 {
        votes
            .iter()
            .filter(|(b, _)| *b == bias)
            .map(|(_, w)| w)
            .sum()
    };
    let mut sums = [
        (Bias::Long, tally(Bias::Long)),
        (Bias::Short, tally(Bias::Short)),
        (Bias::Neutral, tally(Bias::Neutral)),
    ];
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));

    if (sums[0].1 - sums[1].1).abs() < 1e-12 {
        return (Bias::Neutral, 0.0);
    }
    (sums[0].0, (sums[0].1 / total).clamp(0.0, 1.0))
}

/// Runs the indicator engine per timeframe and merges the votes
#[derive(Debug, Clone)]
pub struct MultiTimeframeAggregator {
    config: ScanConfig,
}

impl MultiTimeframeAggregator {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Fetch every configured timeframe from the provider and assess
    pub fn assess(
        &self,
        instrument: &str,
        provider: &dyn MarketDataProvider,
    ) -> Result<ConfluenceAssessment> {
        let inputs = self
            .config
            .timeframes
            .iter()
            .map(|setting| {
                let count = self.config.bars_needed(setting);
                (
                    setting.clone(),
                    provider.bars(instrument, setting.timeframe, count),
                )
            })
            .collect();
        self.assess_series(instrument, inputs)
    }

    /// Assess already-fetched series.
    ///
    /// Missing, short or malformed data excludes that timeframe; any other
    /// error aborts the assessment.
    pub fn assess_series(
        &self,
        instrument: &str,
        inputs: Vec<(TimeframeSetting, Result<BarSeries>)>,
    ) -> Result<ConfluenceAssessment> {
        let mut readings = Vec::new();
        let mut excluded = Vec::new();

        for (setting, series) in inputs {
            match series.and_then(|s| self.read_timeframe(&setting, &s)) {
                Ok(reading) => {
                    debug!(
                        instrument,
                        timeframe = %reading.timeframe,
                        rsi = reading.rsi.value,
                        vote = ?reading.vote,
                        "timeframe reading"
                    );
                    readings.push(reading);
                }
                Err(e) if !e.is_timeframe_local() => return Err(e),
                Err(e) => {
                    warn!(instrument, timeframe = %setting.timeframe, error = %e, "timeframe excluded from voting");
                    excluded.push(ExcludedTimeframe {
                        timeframe: setting.timeframe,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if readings.is_empty() {
            return Err(SignalError::NoUsableData {
                instrument: instrument.to_string(),
            });
        }
        readings.sort_by_key(|r| r.timeframe);

        let votes: Vec<(Bias, f64)> = readings.iter().map(|r| (r.vote, r.weight)).collect();
        let (majority, agreement_score) = score_votes(&votes);

        Ok(ConfluenceAssessment {
            instrument: instrument.to_string(),
            readings,
            excluded,
            majority,
            agreement_score,
        })
    }

    /// RSI, swing and Fibonacci for one timeframe, plus its vote
    pub fn read_timeframe(
        &self,
        setting: &TimeframeSetting,
        series: &BarSeries,
    ) -> Result<TimeframeReading> {
        let bars = series.bars();
        let rsi = rsi(bars, self.config.rsi_period, setting.timeframe)?;
        let swing = detect_swing(bars, setting.swing_lookback)?;
        let fib = FibonacciLevels::from_swing(swing);
        let last_close = series.last_close().ok_or(SignalError::InsufficientData {
            needed: 1,
            got: 0,
        })?;

        let touched = fib.touched(last_close, self.config.fib_tolerance_pct);
        let vote = self.vote(&rsi, &fib, touched.is_some());

        Ok(TimeframeReading {
            timeframe: setting.timeframe,
            weight: setting.weight,
            rsi,
            fib,
            last_close,
            touched,
            vote,
        })
    }

    /// Oversold RSI or a touched support leans long, the mirror leans short;
    /// RSI and level pointing opposite ways cancel out
    fn vote(&self, rsi: &RsiReading, fib: &FibonacciLevels, touched: bool) -> Bias {
        let rsi_bias = if rsi.value < self.config.rsi_oversold {
            Bias::Long
        } else if rsi.value > self.config.rsi_overbought {
            Bias::Short
        } else {
            Bias::Neutral
        };
        let level_bias = match (touched, fib.role()) {
            (false, _) => Bias::Neutral,
            (true, LevelRole::Support) => Bias::Long,
            (true, LevelRole::Resistance) => Bias::Short,
        };

        match (rsi_bias, level_bias) {
            (Bias::Neutral, other) | (other, Bias::Neutral) => other,
            (a, b) if a == b => a,
            _ => Bias::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Bar;
    use chrono::{Duration, TimeZone, Utc};

    fn series(closes: &[f64]) -> BarSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + Duration::hours(i as i64), c, c, c, c, 1.0))
            .collect();
        BarSeries::new(bars).unwrap()
    }

    fn falling(n: usize) -> BarSeries {
        series(&(0..n).map(|i| 200.0 - i as f64).collect::<Vec<_>>())
    }

    fn rising(n: usize) -> BarSeries {
        series(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
    }

    fn aggregator() -> MultiTimeframeAggregator {
        let mut config = ScanConfig::default();
        for setting in config.timeframes.iter_mut() {
            setting.weight = 1.0;
            setting.swing_lookback = 20;
        }
        MultiTimeframeAggregator::new(config)
    }

    fn setting(tf: Timeframe) -> TimeframeSetting {
        TimeframeSetting::new(tf, 1.0, 20)
    }

    #[test]
    fn test_score_votes() {
        assert_eq!(score_votes(&[]), (Bias::Neutral, 0.0));
        assert_eq!(
            score_votes(&[(Bias::Long, 1.0), (Bias::Long, 1.0), (Bias::Long, 1.0)]),
            (Bias::Long, 1.0)
        );

        let (bias, score) = score_votes(&[(Bias::Short, 1.0), (Bias::Short, 1.0), (Bias::Neutral, 1.0)]);
        assert_eq!(bias, Bias::Short);
        assert!((score - 2.0 / 3.0).abs() < 1e-12);

        // tie: no majority
        assert_eq!(
            score_votes(&[(Bias::Long, 1.0), (Bias::Short, 1.0)]),
            (Bias::Neutral, 0.0)
        );
    }

    #[test]
    fn test_weights_break_ties() {
        let (bias, score) = score_votes(&[(Bias::Long, 1.0), (Bias::Short, 2.0)]);
        assert_eq!(bias, Bias::Short);
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_timeframes_agree_on_overbought() {
        // rising closes: RSI 100 everywhere, overbought
        let agg = aggregator();
        let assessment = agg
            .assess_series(
                "XAUUSD",
                vec![
                    (setting(Timeframe::D1), Ok(rising(30))),
                    (setting(Timeframe::H1), Ok(rising(30))),
                    (setting(Timeframe::H4), Ok(rising(30))),
                ],
            )
            .unwrap();

        assert_eq!(assessment.majority, Bias::Short);
        assert_eq!(assessment.agreement_score, 1.0);
        assert_eq!(assessment.primary().timeframe, Timeframe::H1);
        assert_eq!(assessment.entry_price(), 129.0);
        assert_eq!(assessment.contributing().count(), 3);
    }

    #[test]
    fn test_missing_timeframe_is_excluded() {
        let agg = aggregator();
        let assessment = agg
            .assess_series(
                "EURUSD",
                vec![
                    (setting(Timeframe::H1), Ok(falling(30))),
                    (
                        setting(Timeframe::H4),
                        Err(SignalError::DataUnavailable {
                            instrument: "EURUSD".into(),
                            timeframe: Timeframe::H4,
                            reason: "rate limited".into(),
                        }),
                    ),
                    (setting(Timeframe::D1), Ok(falling(5))),
                ],
            )
            .unwrap();

        assert_eq!(assessment.readings.len(), 1);
        assert_eq!(assessment.excluded.len(), 2);
        assert_eq!(assessment.majority, Bias::Long);
        assert_eq!(assessment.agreement_score, 1.0);
    }

    #[test]
    fn test_non_finite_close_excludes_only_that_timeframe() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut bars: Vec<Bar> = (0..30)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(start + Duration::hours(i as i64), c, c, c, c, 1.0)
            })
            .collect();
        bars[29].close = f64::NAN;

        let assessment = aggregator()
            .assess_series(
                "XAUUSD",
                vec![
                    (setting(Timeframe::H1), Ok(falling(30))),
                    (setting(Timeframe::H4), BarSeries::new(bars)),
                ],
            )
            .unwrap();

        assert_eq!(assessment.readings.len(), 1);
        assert_eq!(assessment.excluded[0].timeframe, Timeframe::H4);
        assert!(assessment.entry_price().is_finite());
        assert_eq!(assessment.majority, Bias::Long);
    }

    #[test]
    fn test_configuration_error_aborts_assessment() {
        let err = aggregator()
            .assess_series(
                "XAUUSD",
                vec![
                    (setting(Timeframe::H1), Ok(falling(30))),
                    (
                        setting(Timeframe::H4),
                        Err(SignalError::InvalidConfig("bad period".into())),
                    ),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, SignalError::InvalidConfig(_)));
    }

    #[test]
    fn test_all_missing_is_no_usable_data() {
        let agg = aggregator();
        let err = agg
            .assess_series("GBPUSD", vec![(setting(Timeframe::H1), Ok(falling(3)))])
            .unwrap_err();
        assert_eq!(
            err,
            SignalError::NoUsableData {
                instrument: "GBPUSD".into()
            }
        );
    }

    #[test]
    fn test_conflicting_timeframes_have_no_majority() {
        let agg = aggregator();
        let assessment = agg
            .assess_series(
                "XAUUSD",
                vec![
                    (setting(Timeframe::H1), Ok(falling(30))),
                    (setting(Timeframe::H4), Ok(rising(30))),
                ],
            )
            .unwrap();
        assert_eq!(assessment.majority, Bias::Neutral);
        assert_eq!(assessment.agreement_score, 0.0);
    }

    #[test]
    fn test_touched_support_votes_long() {
        // up-move 100 -> 200 then pullback onto the 0.618 level (161.8)
        let mut closes: Vec<f64> = (0..=20).map(|i| 100.0 + i as f64 * 5.0).collect();
        closes.extend([190.0, 180.0, 170.0, 165.0, 162.0]);
        let mut config = ScanConfig::default();
        config.rsi_period = 3;
        let agg = MultiTimeframeAggregator::new(config);

        let reading = agg
            .read_timeframe(&TimeframeSetting::new(Timeframe::H4, 1.0, 26), &series(&closes))
            .unwrap();
        assert_eq!(reading.fib.role(), LevelRole::Support);
        assert_eq!(reading.touched.unwrap().ratio, 0.618);
        // RSI after four down bars is oversold too, both agree
        assert!(reading.rsi.value < 30.0);
        assert_eq!(reading.vote, Bias::Long);
    }
}
