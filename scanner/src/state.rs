use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use confluence::prelude::*;
use shared::{Config, DataSource};
use tokio::sync::broadcast;

/// Capacity of the lifecycle event channel
const EVENT_BUFFER: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<SignalPipeline>,
    pub book: Arc<SignalBook>,
    pub params: RiskParameters,
    /// Bar store fed by an external collaborator when `DATA_SOURCE=store`
    pub store: Arc<BarStore>,
    pub events: broadcast::Sender<LifecycleEvent>,
}

impl AppState {
    pub async fn new() -> std::result::Result<Self, anyhow::Error> {
        let config = Config::from_env()?;
        let scan_config = match &config.scan_config_path {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading scan config {path}"))?;
                ScanConfig::from_json_str(&raw).with_context(|| format!("parsing {path}"))?
            }
            None => ScanConfig::default(),
        };

        let params = scan_config.risk.parameters(config.account_equity);
        params.validate().context("risk parameters")?;
        let pipeline = SignalPipeline::new(scan_config).context("scan config")?;
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Ok(AppState {
            config,
            pipeline: Arc::new(pipeline),
            book: Arc::new(SignalBook::new()),
            params,
            store: Arc::new(BarStore::new()),
            events,
        })
    }

    /// Provider variant chosen by configuration; the synthetic one is
    /// re-anchored on every cycle
    pub fn provider(&self, now: DateTime<Utc>) -> Arc<dyn MarketDataProvider> {
        match self.config.data_source {
            DataSource::Fallback => Arc::new(SyntheticProvider::new(now)),
            DataSource::Store => self.store.clone(),
        }
    }
}
