use std::str::FromStr;

use anyhow::Context;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};

const DEFAULT_INSTRUMENTS: &str = "XAUUSD,EURUSD,GBPUSD";

/// Which market-data provider variant the host wires in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Seeded synthetic bars for demonstration
    Fallback,
    /// In-memory store fed by an external collaborator
    Store,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fallback" | "synthetic" => Ok(DataSource::Fallback),
            "store" | "live" => Ok(DataSource::Store),
            other => anyhow::bail!("unknown DATA_SOURCE '{other}', expected fallback or store"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub instruments: Vec<String>,
    pub scan_interval_secs: u64,
    pub account_equity: f64,
    /// Optional JSON scan configuration, defaults apply when absent
    pub scan_config_path: Option<String>,
    pub data_source: DataSource,
    pub scan_when_market_closed: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let instruments = parse_instruments(
            &std::env::var("INSTRUMENTS").unwrap_or_else(|_| DEFAULT_INSTRUMENTS.to_string()),
        );
        if instruments.is_empty() {
            anyhow::bail!("INSTRUMENTS must name at least one instrument");
        }

        let account_equity: f64 = std::env::var("ACCOUNT_EQUITY")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .context("ACCOUNT_EQUITY must be a number")?;
        if !(account_equity.is_finite() && account_equity > 0.0) {
            anyhow::bail!("ACCOUNT_EQUITY must be positive, got {account_equity}");
        }

        Ok(Config {
            bot_name: std::env::var("BOT_NAME").unwrap_or_else(|_| "ConfluenceScanner".to_string()),
            instruments,
            scan_interval_secs: std::env::var("SCAN_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("SCAN_INTERVAL_SECS must be a whole number of seconds")?,
            account_equity,
            scan_config_path: std::env::var("SCAN_CONFIG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            data_source: std::env::var("DATA_SOURCE")
                .unwrap_or_else(|_| "fallback".to_string())
                .parse()?,
            scan_when_market_closed: parse_flag("SCAN_WHEN_MARKET_CLOSED"),
        })
    }
}

fn parse_flag(key: &str) -> bool {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "expected true or false, using false");
            false
        }),
        Err(_) => false,
    }
}

/// Comma separated symbols, upper-cased, separators stripped, duplicates dropped
pub fn parse_instruments(raw: &str) -> Vec<String> {
    let mut instruments: Vec<String> = Vec::new();
    for symbol in raw.split(',') {
        let symbol: String = symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_uppercase();
        if !symbol.is_empty() && !instruments.contains(&symbol) {
            instruments.push(symbol);
        }
    }
    instruments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instruments() {
        assert_eq!(
            parse_instruments("xau/usd, EURUSD,,eur-usd , gbpusd"),
            vec!["XAUUSD", "EURUSD", "GBPUSD"]
        );
        assert!(parse_instruments(" , ").is_empty());
    }

    #[test]
    fn test_data_source() {
        assert_eq!("fallback".parse::<DataSource>().unwrap(), DataSource::Fallback);
        assert_eq!("STORE".parse::<DataSource>().unwrap(), DataSource::Store);
        assert!("redis".parse::<DataSource>().is_err());
    }
}
