//! Supported instruments and pip sizes

use serde::{Deserialize, Serialize};

/// Traded instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Symbol without separator, e.g. "XAUUSD"
    pub symbol: String,
    /// Price increment of one pip
    pub pip_size: f64,
}

/// Instruments the scanner monitors out of the box
pub const SUPPORTED_SYMBOLS: [&str; 3] = ["XAUUSD", "EURUSD", "GBPUSD"];

const DEFAULT_PIP: f64 = 0.0001;

impl Instrument {
    /// Look up an instrument, falling back to the forex pip size
    pub fn lookup(symbol: &str) -> Self {
        let symbol = normalize_symbol(symbol);
        let pip_size = match symbol.as_str() {
            "XAUUSD" => 0.1,
            "XAGUSD" => 0.01,
            s if s.ends_with("JPY") => 0.01,
            _ => DEFAULT_PIP,
        };
        Self { symbol, pip_size }
    }

    /// Convert a price distance into pips
    pub fn pips(&self, distance: f64) -> f64 {
        distance / self.pip_size
    }

    /// Whether the symbol is in the default catalog
    pub fn is_supported(&self) -> bool {
        SUPPORTED_SYMBOLS.contains(&self.symbol.as_str())
    }
}

/// Normalize "eur/usd", "EUR-USD" or "eurusd" to "EURUSD"
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}
