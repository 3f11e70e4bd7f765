//! src/eventbus/mod.rs
//!
//! In-process audit bus with guaranteed delivery to multiple subscribers via
//! bounded MPSC queues. Every lifecycle, claim, and award outcome in the core
//! is mirrored here; how subscribers surface the events is their business.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use codedrop_common::models::EventSummary;

/// Why a claim attempt was turned away with no claim recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The participant already holds a record for this event.
    Duplicate,
    /// The claim window is not open (not yet published, or expired).
    EventClosed,
}

/// Why an accepted claim produced no delivered code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardFailure {
    /// Pool was empty; the claim stands but no code was available.
    Exhausted,
    /// The delivery channel failed; the code is consumed regardless.
    Delivery(String),
}

/// Audit events published by the claim core.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    EventStarted {
        event_id: Uuid,
        title: String,
        expires_at: DateTime<Utc>,
    },
    ClaimAccepted {
        event_id: Uuid,
        participant_id: Uuid,
        claimed_at: DateTime<Utc>,
    },
    ClaimRejected {
        event_id: Uuid,
        participant_id: Uuid,
        reason: RejectReason,
    },
    AwardDelivered {
        event_id: Uuid,
        participant_id: Uuid,
    },
    AwardFailed {
        event_id: Uuid,
        participant_id: Uuid,
        reason: AwardFailure,
    },
    EventEnded {
        event_id: Uuid,
        summary: EventSummary,
    },
}

/// Each subscriber gets its own `mpsc::Sender<AuditEvent>` for guaranteed
/// delivery.
///
/// - If a subscriber's buffer fills, `publish` awaits until there is space
///   (backpressure).
/// - If a subscriber has dropped its `Receiver`, the send simply fails and
///   the event moves on to the next subscriber.
#[derive(Clone)]
pub struct AuditBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<AuditEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 200;

impl AuditBus {
    /// Create a new, empty bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// A receiver that resolves when `shutdown` is called; expiry timers and
    /// other background tasks select on this.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Register a new subscriber with a bounded buffer (or the default size).
    pub fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<AuditEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);

        let mut subs = self.subscribers.lock();
        subs.push(tx);

        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: AuditEvent) {
        // Clone the senders outside the lock
        let senders = {
            let guard = self.subscribers.lock();
            guard.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }
}

impl Default for AuditBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    fn started(event_id: Uuid) -> AuditEvent {
        AuditEvent::EventStarted {
            event_id,
            title: "test event".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn all_subscribers_receive_each_event() {
        let bus = AuditBus::new();
        let event_id = Uuid::new_v4();

        let mut rx1 = bus.subscribe(Some(5));
        let mut rx2 = bus.subscribe(Some(5));

        bus.publish(started(event_id)).await;

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.expect("subscriber should get event") {
                AuditEvent::EventStarted { event_id: id, .. } => assert_eq!(id, event_id),
                other => panic!("wrong event type: {other:?}"),
            }
        }
    }

    /// A full 1-slot queue must block the publisher until the subscriber
    /// reads, rather than dropping the event.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn publish_blocks_instead_of_dropping() {
        let bus = AuditBus::new();
        let e1 = Uuid::new_v4();
        let e2 = Uuid::new_v4();
        let mut rx = bus.subscribe(Some(1));

        bus.publish(started(e1)).await;

        let handle = tokio::spawn(async move {
            // Sleep so the second publish is truly blocked until we read
            sleep(Duration::from_millis(50)).await;
            let first = rx.recv().await.expect("expected first event");
            let second = rx.recv().await.expect("expected second event");
            (first, second)
        });

        let second_publish = bus.publish(started(e2));
        let result = timeout(Duration::from_millis(500), second_publish).await;
        assert!(result.is_ok(), "publish should unblock once the subscriber reads");

        let (first, second) = handle.await.unwrap();
        match (first, second) {
            (
                AuditEvent::EventStarted { event_id: a, .. },
                AuditEvent::EventStarted { event_id: b, .. },
            ) => {
                assert_eq!(a, e1);
                assert_eq!(b, e2);
            }
            other => panic!("event order mismatch: {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_signal_resolves() {
        let bus = AuditBus::new();
        let mut signal = bus.shutdown_signal();
        assert!(!bus.is_shutdown());

        bus.shutdown();
        assert!(bus.is_shutdown());
        timeout(Duration::from_millis(100), signal.changed())
            .await
            .expect("signal should fire")
            .expect("sender alive");
    }
}
