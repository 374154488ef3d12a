//! One scan cycle for one instrument: bars in, at most one lifecycle event out

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::analysis::{self, ConfluenceAssessment, MarketAnalysis, MultiTimeframeAggregator};
use crate::config::{RiskParameters, ScanConfig};
use crate::data::{normalize_symbol, Instrument, MarketDataProvider};
use crate::error::Result;
use crate::lifecycle::{LifecycleEvent, LifecyclePolicy, SignalBook};
use crate::portfolio::RiskManager;
use crate::strategy::{Signal, SignalGenerator, SignalValidator};

/// Indicator engine -> aggregator -> generator -> risk manager -> tracker
#[derive(Debug, Clone)]
pub struct SignalPipeline {
    config: ScanConfig,
    aggregator: MultiTimeframeAggregator,
    generator: SignalGenerator,
    risk: RiskManager,
    policy: LifecyclePolicy,
}

impl SignalPipeline {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: MultiTimeframeAggregator::new(config.clone()),
            generator: SignalGenerator::new(config.clone()),
            risk: RiskManager::new(config.risk.clone()),
            policy: LifecyclePolicy::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn assess(
        &self,
        instrument: &str,
        provider: &dyn MarketDataProvider,
    ) -> Result<ConfluenceAssessment> {
        self.aggregator.assess(&normalize_symbol(instrument), provider)
    }

    /// Candidate plus risk plan, `Ok(None)` when the assessment yields no signal.
    ///
    /// Risk-layer errors discard the candidate and are returned to the caller.
    pub fn evaluate(
        &self,
        assessment: &ConfluenceAssessment,
        params: &RiskParameters,
        now: DateTime<Utc>,
    ) -> Result<Option<Signal>> {
        let Some(candidate) = self.generator.generate(assessment) else {
            return Ok(None);
        };
        let plan = self.risk.plan(
            candidate.direction,
            candidate.entry_price,
            &assessment.readings,
            params,
        )?;
        Ok(Some(Signal::new(candidate, plan, now)))
    }

    /// Market snapshot without touching lifecycle state
    pub fn analyze(
        &self,
        instrument: &str,
        provider: &dyn MarketDataProvider,
    ) -> Result<MarketAnalysis> {
        let assessment = self.assess(instrument, provider)?;
        let candidate = self.generator.generate(&assessment);
        Ok(analysis::analyze(
            &assessment,
            &Instrument::lookup(instrument),
            candidate.as_ref(),
        ))
    }

    /// Full cycle for one instrument.
    ///
    /// Holds the instrument's track for the whole cycle; nothing is written
    /// until every stage has succeeded, so an error or a dropped future leaves
    /// the track untouched.
    pub async fn run_cycle(
        &self,
        instrument: &str,
        provider: &dyn MarketDataProvider,
        book: &SignalBook,
        params: &RiskParameters,
        now: DateTime<Utc>,
    ) -> Result<Option<LifecycleEvent>> {
        let symbol = normalize_symbol(instrument);
        let track = book.track(&symbol).await;
        let mut track = track.lock().await;

        let assessment = self.assess(&symbol, provider)?;
        let latest_price = match provider.latest_price(&symbol) {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(instrument = %symbol, error = %e, "no latest price, exits not checked");
                None
            }
        };

        let signal = match self.evaluate(&assessment, params, now) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(instrument = %symbol, error = %e, "signal discarded");
                return Err(e);
            }
        };
        let signal = signal.filter(|s| {
            let valid = SignalValidator::validate(s);
            if !valid {
                warn!(instrument = %symbol, signal = ?s, "signal failed validation, discarded");
            }
            valid
        });

        let event = track.apply(signal, latest_price, now, &self.policy);
        if let Some(event) = &event {
            info!(
                instrument = %symbol,
                status = ?event.status,
                id = %event.signal.id,
                "lifecycle transition"
            );
        }
        Ok(event)
    }
}
