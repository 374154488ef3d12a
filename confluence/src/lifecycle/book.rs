//! Keyed signal store shared by concurrent scan cycles

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::data::normalize_symbol;
use crate::lifecycle::InstrumentTrack;
use crate::strategy::Signal;

/// Instrument -> lifecycle track.
///
/// The outer lock only guards the map; each instrument's track has its own
/// mutex so cycles for different instruments never wait on each other.
#[derive(Debug, Default)]
pub struct SignalBook {
    tracks: RwLock<HashMap<String, Arc<Mutex<InstrumentTrack>>>>,
}

impl SignalBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track handle for an instrument, created on first use
    pub async fn track(&self, instrument: &str) -> Arc<Mutex<InstrumentTrack>> {
        let key = normalize_symbol(instrument);
        if let Some(track) = self.tracks.read().await.get(&key) {
            return track.clone();
        }
        let mut tracks = self.tracks.write().await;
        tracks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(InstrumentTrack::new(key))))
            .clone()
    }

    async fn handles(&self) -> Vec<Arc<Mutex<InstrumentTrack>>> {
        self.tracks.read().await.values().cloned().collect()
    }

    /// Instruments seen so far, sorted
    pub async fn instruments(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.tracks.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn active(&self, instrument: &str) -> Option<Signal> {
        let key = normalize_symbol(instrument);
        let track = self.tracks.read().await.get(&key).cloned()?;
        let track = track.lock().await;
        track.active().cloned()
    }

    pub async fn history(&self, instrument: &str) -> Vec<Signal> {
        let key = normalize_symbol(instrument);
        let Some(track) = self.tracks.read().await.get(&key).cloned() else {
            return Vec::new();
        };
        let track = track.lock().await;
        track.history().to_vec()
    }

    /// Currently active signals across instruments
    pub async fn active_signals(&self) -> Vec<Signal> {
        let mut active = Vec::new();
        for track in self.handles().await {
            if let Some(signal) = track.lock().await.active() {
                active.push(signal.clone());
            }
        }
        active.sort_by(|a, b| a.instrument.cmp(&b.instrument));
        active
    }

    /// Newest signals first across all instruments
    pub async fn recent_signals(&self, limit: usize) -> Vec<Signal> {
        let mut all = Vec::new();
        for track in self.handles().await {
            all.extend(track.lock().await.history().iter().cloned());
        }
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        all
    }

    /// Signals created on the UTC calendar day of `now`
    pub async fn signals_today(&self, now: DateTime<Utc>) -> usize {
        let today = now.date_naive();
        let mut count = 0;
        for track in self.handles().await {
            count += track
                .lock()
                .await
                .history()
                .iter()
                .filter(|s| s.created_at.date_naive() == today)
                .count();
        }
        count
    }

    pub async fn total_signals(&self) -> usize {
        let mut count = 0;
        for track in self.handles().await {
            count += track.lock().await.history().len();
        }
        count
    }
}
