//! Periodic market scanner: one pipeline run per instrument per tick

use std::sync::Arc;

use chrono::{DateTime, Utc};
use confluence::prelude::*;
use futures::future::join_all;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

pub struct MarketScanner {
    state: Arc<AppState>,
}

impl MarketScanner {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Tick forever; dropping the future between or during cycles is safe
    pub async fn run(&self) {
        let secs = self.state.config.scan_interval_secs.max(1);
        let mut timer = interval(Duration::from_secs(secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("⏰ Scanner started: {} instruments every {}s", self.state.config.instruments.len(), secs);

        loop {
            timer.tick().await;
            let now = Utc::now();
            let events = self.scan_once(now).await;
            info!(
                "📊 Cycle done: {} transitions, {} signals today, {} active",
                events.len(),
                self.state.book.signals_today(now).await,
                self.state.book.active_signals().await.len()
            );
        }
    }

    /// Run every instrument concurrently and publish the resulting events
    pub async fn scan_once(&self, now: DateTime<Utc>) -> Vec<LifecycleEvent> {
        if forex_session(now) == MarketSession::Closed && !self.state.config.scan_when_market_closed {
            info!("🌙 Forex market closed, skipping cycle");
            return Vec::new();
        }

        let provider = self.state.provider(now);
        debug!("Scanning {} instruments on {} data", self.state.config.instruments.len(), provider.name());
        let cycles = self.state.config.instruments.iter().map(|instrument| {
            let provider = provider.clone();
            async move {
                let result = self
                    .state
                    .pipeline
                    .run_cycle(instrument, provider.as_ref(), &self.state.book, &self.state.params, now)
                    .await;
                (instrument, result)
            }
        });

        let mut events = Vec::new();
        for (instrument, result) in join_all(cycles).await {
            match result {
                Ok(Some(event)) => {
                    if self.state.events.send(event.clone()).is_err() {
                        debug!("No notifier listening for {}", instrument);
                    }
                    events.push(event);
                }
                Ok(None) => debug!("{}: no transition", instrument),
                Err(e) if e.is_fatal_for_signal() => {
                    error!("❌ {}: signal discarded: {}", instrument, e)
                }
                Err(e) => warn!("⚠️ {}: skipped this cycle on {} data: {}", instrument, provider.name(), e),
            }
        }
        events
    }

    /// Log a market snapshot per instrument
    pub fn log_snapshot(&self, now: DateTime<Utc>) {
        let provider = self.state.provider(now);
        for instrument in &self.state.config.instruments {
            match self.state.pipeline.analyze(instrument, provider.as_ref()) {
                Ok(analysis) => info!(
                    "🔍 {} price {:.5} | {:?} strength {}/10 | {:?} | 0.618 {} ({} pips)",
                    analysis.instrument,
                    analysis.current_price,
                    analysis.sentiment,
                    analysis.strength,
                    analysis.recommendation,
                    analysis
                        .fib_618
                        .map(|p| format!("{p:.5}"))
                        .unwrap_or_else(|| "n/a".to_string()),
                    analysis
                        .distance_to_618_pips
                        .map(|d| format!("{d:.1}"))
                        .unwrap_or_else(|| "n/a".to_string()),
                ),
                Err(e) => warn!("⚠️ {}: no snapshot: {}", instrument, e),
            }
        }
    }
}
