//! Property and worked-example tests for the confluence core

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use confluence::analysis::{score_votes, Bias};
    use confluence::config::RiskParameters;
    use confluence::data::{Bar, Timeframe};
    use confluence::indicators::{detect_swing, rsi, FibonacciLevels, SwingDirection, SwingPoint};
    use confluence::portfolio::RiskManager;
    use proptest::prelude::*;

    fn bars_from(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + Duration::hours(i as i64), c, c, c, c, 1.0))
            .collect()
    }

    fn swing(low: f64, high: f64, direction: SwingDirection) -> SwingPoint {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let later = t + Duration::hours(8);
        let (low_time, high_time) = match direction {
            SwingDirection::Up => (t, later),
            SwingDirection::Down => (later, t),
        };
        SwingPoint {
            high,
            low,
            high_time,
            low_time,
            direction,
        }
    }

    fn bias() -> impl Strategy<Value = Bias> {
        prop_oneof![Just(Bias::Long), Just(Bias::Short), Just(Bias::Neutral)]
    }

    proptest! {
        #[test]
        fn flat_market_rsi_is_neutral(
            price in 0.01f64..1_000_000.0,
            period in 1usize..30,
            extra in 0usize..60,
        ) {
            let bars = bars_from(&vec![price; period + 1 + extra]);
            let reading = rsi(&bars, period, Timeframe::H1).unwrap();
            prop_assert_eq!(reading.value, 50.0);
        }

        #[test]
        fn rising_closes_rsi_is_100(
            start in 1.0f64..10_000.0,
            steps in prop::collection::vec(0.001f64..50.0, 15..80),
        ) {
            let mut closes = vec![start];
            for step in &steps {
                let next = closes[closes.len() - 1] + step;
                closes.push(next);
            }
            let reading = rsi(&bars_from(&closes), 14, Timeframe::H4).unwrap();
            prop_assert_eq!(reading.value, 100.0);
        }

        #[test]
        fn fib_endpoints_are_swing_extremes(
            low in 0.5f64..5_000.0,
            range in 0.0001f64..1_000.0,
            up in any::<bool>(),
        ) {
            let direction = if up { SwingDirection::Up } else { SwingDirection::Down };
            let s = swing(low, low + range, direction);
            let fib = FibonacciLevels::from_swing(s);
            let eps = 1e-9 * (low + range);
            prop_assert!((fib.price_at(0.0) - s.start()).abs() <= eps);
            prop_assert!((fib.price_at(1.0) - s.end()).abs() <= eps);

            // levels stay between the extremes, monotonic in ratio
            let prices: Vec<f64> = fib.levels.iter().map(|l| l.price).collect();
            for p in &prices {
                prop_assert!(*p >= s.low - eps && *p <= s.high + eps);
            }
            for pair in prices.windows(2) {
                match direction {
                    SwingDirection::Up => {
                        prop_assert!(pair[0] < pair[1]);
                    }
                    SwingDirection::Down => {
                        prop_assert!(pair[0] > pair[1]);
                    }
                }
            }
        }

        #[test]
        fn agreement_score_in_unit_interval(
            votes in prop::collection::vec((bias(), 0.1f64..10.0), 1..8),
        ) {
            let (majority, score) = score_votes(&votes);
            prop_assert!((0.0..=1.0).contains(&score));

            let unanimous = votes.iter().all(|(b, _)| *b == votes[0].0);
            if unanimous {
                prop_assert_eq!(score, 1.0);
                prop_assert_eq!(majority, votes[0].0);
            }
            if score == 1.0 {
                prop_assert!(unanimous);
            }
        }

        #[test]
        fn position_value_never_exceeds_cap(
            equity in 100.0f64..10_000_000.0,
            risk in 0.001f64..0.1,
            max_fraction in 0.01f64..1.0,
            entry in 0.5f64..5_000.0,
            stop_offset in 0.0001f64..0.2,
            long in any::<bool>(),
        ) {
            let stop = if long { entry * (1.0 - stop_offset) } else { entry * (1.0 + stop_offset) };
            let params = RiskParameters {
                account_equity: equity,
                risk_per_trade_fraction: risk,
                max_position_fraction: max_fraction,
                reward_risk_ratio: 2.0,
            };
            let size = RiskManager::calculate_position_size(entry, stop, &params).unwrap();
            prop_assert!(size > 0.0);
            prop_assert!(size * entry <= equity * max_fraction * (1.0 + 1e-9));
        }
    }

    #[test]
    fn test_rising_window_example() {
        // closes 100 -> 114
        let closes: Vec<f64> = (100..=114).map(|c| c as f64).collect();
        let bars = bars_from(&closes);

        let reading = rsi(&bars, 14, Timeframe::H1).unwrap();
        assert_eq!(reading.value, 100.0);

        let swing = detect_swing(&bars, 15).unwrap();
        assert_eq!(swing.low, 100.0);
        assert_eq!(swing.high, 114.0);
        assert!(swing.low_time < swing.high_time);
        assert_eq!(swing.direction, SwingDirection::Up);

        let fib = FibonacciLevels::from_swing(swing);
        let golden = fib.level(0.618).unwrap();
        assert!((golden - 108.652).abs() < 1e-9);
    }

    #[test]
    fn test_position_cap_example() {
        let params = RiskParameters {
            account_equity: 10_000.0,
            risk_per_trade_fraction: 0.01,
            max_position_fraction: 0.5,
            reward_risk_ratio: 2.0,
        };
        let size = RiskManager::calculate_position_size(1900.0, 1880.0, &params).unwrap();
        assert_eq!(format!("{size:.2}"), "2.63");
    }

    #[test]
    fn test_insufficient_bars() {
        let bars = bars_from(&[1.0, 2.0, 3.0]);
        assert!(rsi(&bars, 14, Timeframe::H1).is_err());
        assert!(detect_swing(&bars, 10).is_err());
    }
}
