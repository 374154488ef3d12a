//! Per-instrument signal state machine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::strategy::{ExitReason, Signal, SignalStatus};

/// Expiry and duplicate-suppression rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecyclePolicy {
    pub ttl: Duration,
    pub confidence_delta: f64,
    pub entry_tolerance_pct: f64,
}

impl LifecyclePolicy {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            ttl: config.signal_ttl(),
            confidence_delta: config.dedup.confidence_delta,
            entry_tolerance_pct: config.dedup.entry_tolerance_pct,
        }
    }

    /// Same direction, confidence within the delta and entry within tolerance
    pub fn is_duplicate(&self, active: &Signal, candidate: &Signal) -> bool {
        let entry_move_pct =
            (candidate.entry_price - active.entry_price).abs() / active.entry_price * 100.0;
        active.direction == candidate.direction
            && (candidate.confidence - active.confidence).abs() < self.confidence_delta
            && entry_move_pct <= self.entry_tolerance_pct
    }
}

/// Prior signal that left `active` during the cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Retired {
    pub id: Uuid,
    pub status: SignalStatus,
    pub exit: Option<ExitReason>,
}

/// The single transition emitted for one instrument in one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub instrument: String,
    /// Status of `signal` after the transition
    pub status: SignalStatus,
    pub signal: Signal,
    /// Set when a new signal replaced one in the same cycle
    pub replaced: Option<Retired>,
}

/// Append-only signal log for one instrument plus the active pointer
#[derive(Debug, Clone, Default)]
pub struct InstrumentTrack {
    instrument: String,
    history: Vec<Signal>,
    active: Option<Uuid>,
}

impl InstrumentTrack {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            history: Vec::new(),
            active: None,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn active(&self) -> Option<&Signal> {
        let id = self.active?;
        self.history
            .iter()
            .rev()
            .find(|s| s.id == id)
            .filter(|s| s.is_active())
    }

    /// Every signal ever created for the instrument, oldest first
    pub fn history(&self) -> &[Signal] {
        &self.history
    }

    fn active_mut(&mut self) -> Option<&mut Signal> {
        let id = self.active?;
        self.history.iter_mut().rev().find(|s| s.id == id)
    }

    /// Run one cycle's transitions.
    ///
    /// The active signal is first closed on a stop/target hit or expired past
    /// its TTL; then `candidate` either is suppressed as a duplicate,
    /// supersedes the active signal, or becomes active. Returns at most one
    /// event.
    pub fn apply(
        &mut self,
        candidate: Option<Signal>,
        latest_price: Option<f64>,
        now: DateTime<Utc>,
        policy: &LifecyclePolicy,
    ) -> Option<LifecycleEvent> {
        let instrument = self.instrument.clone();
        let mut retired = self.retire_stale(latest_price, now, policy);

        if let Some(mut candidate) = candidate {
            if let Some(active) = self.active_mut() {
                if policy.is_duplicate(active, &candidate) {
                    debug!(
                        instrument = %instrument,
                        direction = %candidate.direction,
                        confidence = candidate.confidence,
                        "duplicate signal suppressed"
                    );
                    return None;
                }
                active.status = SignalStatus::Superseded;
                active.superseded_by = Some(candidate.id);
                info!(
                    instrument = %instrument,
                    old = %active.id,
                    new = %candidate.id,
                    "signal superseded"
                );
                retired = Some(Retired {
                    id: active.id,
                    status: SignalStatus::Superseded,
                    exit: None,
                });
            }

            candidate.status = SignalStatus::Active;
            info!(
                instrument = %instrument,
                id = %candidate.id,
                direction = %candidate.direction,
                confidence = candidate.confidence,
                entry = candidate.entry_price,
                "signal activated"
            );
            self.active = Some(candidate.id);
            self.history.push(candidate.clone());
            return Some(LifecycleEvent {
                instrument,
                status: SignalStatus::Active,
                signal: candidate,
                replaced: retired,
            });
        }

        let retired = retired?;
        let signal = self.history.iter().rev().find(|s| s.id == retired.id)?.clone();
        Some(LifecycleEvent {
            instrument,
            status: retired.status,
            signal,
            replaced: None,
        })
    }

    fn retire_stale(
        &mut self,
        latest_price: Option<f64>,
        now: DateTime<Utc>,
        policy: &LifecyclePolicy,
    ) -> Option<Retired> {
        let instrument = self.instrument.clone();
        let active = self.active_mut()?;

        let exit = latest_price.and_then(|price| active.exit_hit(price));
        if let Some(reason) = exit {
            active.status = SignalStatus::Closed;
            active.exit = Some(reason);
            info!(instrument = %instrument, id = %active.id, exit = ?reason, "signal closed");
        } else if active.age(now) > policy.ttl {
            active.status = SignalStatus::Expired;
            info!(instrument = %instrument, id = %active.id, "signal expired");
        } else {
            return None;
        }

        let retired = Retired {
            id: active.id,
            status: active.status,
            exit: active.exit,
        };
        self.active = None;
        Some(retired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::signal::tests::sample_signal;
    use crate::strategy::Direction;
    use chrono::TimeZone;

    fn policy() -> LifecyclePolicy {
        LifecyclePolicy::from_config(&ScanConfig::default())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap()
    }

    fn seeded() -> (InstrumentTrack, Uuid) {
        let mut track = InstrumentTrack::new("XAUUSD");
        let first = sample_signal(Direction::Long, 1900.0, 1880.0, 1940.0);
        let id = first.id;
        let event = track.apply(Some(first), None, now(), &policy()).unwrap();
        assert_eq!(event.status, SignalStatus::Active);
        assert!(event.replaced.is_none());
        (track, id)
    }

    #[test]
    fn test_first_signal_becomes_active() {
        let (track, id) = seeded();
        assert_eq!(track.active().unwrap().id, id);
        assert_eq!(track.history().len(), 1);
    }

    #[test]
    fn test_opposite_direction_supersedes() {
        let (mut track, old_id) = seeded();
        let mut short = sample_signal(Direction::Short, 1900.0, 1920.0, 1860.0);
        short.confidence = 0.7;
        let new_id = short.id;

        let event = track
            .apply(Some(short), Some(1901.0), now(), &policy())
            .unwrap();

        assert_eq!(event.status, SignalStatus::Active);
        assert_eq!(event.signal.id, new_id);
        let replaced = event.replaced.unwrap();
        assert_eq!(replaced.id, old_id);
        assert_eq!(replaced.status, SignalStatus::Superseded);

        let old = &track.history()[0];
        assert_eq!(old.status, SignalStatus::Superseded);
        assert_eq!(old.superseded_by, Some(new_id));
        assert_eq!(track.active().unwrap().id, new_id);
        assert_eq!(
            track.history().iter().filter(|s| s.is_active()).count(),
            1
        );
    }

    #[test]
    fn test_same_state_is_suppressed() {
        let (mut track, id) = seeded();
        let mut again = sample_signal(Direction::Long, 1901.0, 1881.0, 1941.0);
        again.confidence = 0.72;

        assert!(track.apply(Some(again), Some(1901.0), now(), &policy()).is_none());
        assert_eq!(track.history().len(), 1);
        assert_eq!(track.active().unwrap().id, id);
    }

    #[test]
    fn test_material_confidence_change_supersedes() {
        let (mut track, _) = seeded();
        let mut stronger = sample_signal(Direction::Long, 1900.0, 1880.0, 1940.0);
        stronger.confidence = 0.9;
        let event = track.apply(Some(stronger), None, now(), &policy()).unwrap();
        assert_eq!(event.replaced.unwrap().status, SignalStatus::Superseded);
    }

    #[test]
    fn test_stop_hit_closes() {
        let (mut track, id) = seeded();
        let event = track.apply(None, Some(1879.5), now(), &policy()).unwrap();

        assert_eq!(event.status, SignalStatus::Closed);
        assert_eq!(event.signal.id, id);
        assert_eq!(event.signal.exit, Some(ExitReason::StopLoss));
        assert!(track.active().is_none());
        // terminal, nothing more to report
        assert!(track.apply(None, Some(1700.0), now(), &policy()).is_none());
    }

    #[test]
    fn test_expiry_then_new_identity() {
        let (mut track, id) = seeded();
        let later = now() + Duration::hours(25);

        let event = track.apply(None, Some(1905.0), later, &policy()).unwrap();
        assert_eq!(event.status, SignalStatus::Expired);
        assert_eq!(event.signal.id, id);

        let fresh = sample_signal(Direction::Long, 1900.0, 1880.0, 1940.0);
        let fresh_id = fresh.id;
        let event = track.apply(Some(fresh), Some(1905.0), later, &policy()).unwrap();
        assert_eq!(event.signal.id, fresh_id);
        assert!(event.replaced.is_none());
        assert_eq!(track.history().len(), 2);
        assert_eq!(track.history()[0].status, SignalStatus::Expired);
    }

    #[test]
    fn test_take_profit_and_replacement_in_one_event() {
        let (mut track, id) = seeded();
        let next = sample_signal(Direction::Short, 1945.0, 1965.0, 1905.0);

        let event = track.apply(Some(next), Some(1945.0), now(), &policy()).unwrap();
        let replaced = event.replaced.unwrap();
        assert_eq!(replaced.id, id);
        assert_eq!(replaced.status, SignalStatus::Closed);
        assert_eq!(replaced.exit, Some(ExitReason::TakeProfit));
    }
}
