//! Stand-in for the storage/notification collaborator: logs every lifecycle
//! event as JSON

use confluence::prelude::*;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub fn spawn_notifier(
    mut receiver: broadcast::Receiver<LifecycleEvent>,
    bot_name: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    info!("🔔 [{}] {}", bot_name, headline(&event));
                    match serde_json::to_string(&event) {
                        Ok(json) => info!(target: "signal_events", "{}", json),
                        Err(e) => error!("Failed to serialize event for {}: {}", event.instrument, e),
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Event channel closed, notifier stopping");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Notifier lagged behind, skipped {} events", skipped);
                }
            }
        }
    })
}

/// One-line summary of a transition
pub fn headline(event: &LifecycleEvent) -> String {
    let signal = &event.signal;
    match event.status {
        SignalStatus::Active => {
            let replaced = match &event.replaced {
                Some(r) => format!(" (replaces {} {:?})", r.id, r.status),
                None => String::new(),
            };
            format!(
                "{} {} @ {:.5} SL {:.5} TP {:.5} size {:.4} conf {:.0}%{} | {}",
                signal.direction,
                event.instrument,
                signal.entry_price,
                signal.stop_loss,
                signal.take_profit,
                signal.position_size,
                signal.confidence * 100.0,
                replaced,
                signal.rationale
            )
        }
        SignalStatus::Closed => format!(
            "{} {} closed by {:?}",
            signal.direction, event.instrument, signal.exit
        ),
        status => format!("{} {} {:?}", signal.direction, event.instrument, status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(status: SignalStatus) -> LifecycleEvent {
        let candidate = SignalCandidate {
            instrument: "XAUUSD".into(),
            direction: Direction::Short,
            confidence: 0.7,
            entry_price: 1900.0,
            rationale: Rationale {
                agreeing: vec![Timeframe::H1, Timeframe::H4],
                rsi: vec![],
                nearest_level: None,
                agreement_score: 1.0,
                low_quality: false,
            },
        };
        let plan = RiskPlan {
            stop_loss: 1920.0,
            take_profit: 1860.0,
            position_size: 0.25,
            risk_reward: 2.0,
            position_fraction: 0.05,
            stop_source: StopSource::FixedPercent,
        };
        let mut signal = Signal::new(candidate, plan, Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap());
        signal.status = status;
        LifecycleEvent {
            instrument: "XAUUSD".into(),
            status,
            signal,
            replaced: None,
        }
    }

    #[test]
    fn test_headline() {
        let line = headline(&event(SignalStatus::Active));
        assert!(line.starts_with("SELL XAUUSD @ 1900.00000 SL 1920.00000 TP 1860.00000"));
        assert!(line.contains("conf 70%"));
        assert!(line.ends_with("1h/4h agree (100%)"));

        assert_eq!(headline(&event(SignalStatus::Expired)), "SELL XAUUSD Expired");
    }

    #[tokio::test]
    async fn test_notifier_stops_when_channel_closes() {
        let (tx, rx) = broadcast::channel(4);
        let handle = spawn_notifier(rx, "test".to_string());
        tx.send(event(SignalStatus::Active)).unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
