use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use confluence::data::Instrument;
use tracing_subscriber::EnvFilter;

mod services;
mod state;

use crate::services::notifier::spawn_notifier;
use crate::services::scanner::MarketScanner;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting confluence scanner...");

    let app_state = Arc::new(AppState::new().await?);
    tracing::info!(
        "AppState initialized: {} on {:?} data, instruments {:?}",
        app_state.config.bot_name,
        app_state.config.data_source,
        app_state.config.instruments
    );

    for symbol in &app_state.config.instruments {
        let instrument = Instrument::lookup(symbol);
        if !instrument.is_supported() {
            tracing::warn!(
                "⚠️ {} is outside the built-in catalog, assuming pip size {}",
                instrument.symbol,
                instrument.pip_size
            );
        }
    }

    let notifier = spawn_notifier(app_state.events.subscribe(), app_state.config.bot_name.clone());

    let scanner = MarketScanner::new(app_state.clone());
    scanner.log_snapshot(Utc::now());

    tokio::select! {
        _ = scanner.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
            }
            tracing::info!("🛑 Shutting down");
        }
    }

    for signal in app_state.book.recent_signals(5).await {
        tracing::info!(
            "Recent: {} {} {:?} @ {:.5} ({})",
            signal.direction,
            signal.instrument,
            signal.status,
            signal.entry_price,
            signal.created_at
        );
    }
    tracing::info!("Total signals this session: {}", app_state.book.total_signals().await);

    drop(scanner);
    drop(app_state);
    notifier.abort();
    Ok(())
}
