// File: src/test_utils/mod.rs
//
// In-memory fakes for the external contracts (ledger, event store, delivery
// channel). They mirror the semantics of the real implementations closely
// enough to exercise the claim core without Postgres or a chat platform.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use codedrop_common::error::Error;
use codedrop_common::models::{ClaimEvent, ClaimRecord, EventStatus};
use codedrop_common::traits::repository_traits::{ClaimEventRepository, ClaimLedger};

use crate::services::award_dispatcher::AwardDelivery;

/// Ledger fake with the same write-once semantics as the Postgres version:
/// the map entry is the uniqueness constraint, and the entry API makes the
/// insert atomic under concurrent puts.
#[derive(Default)]
pub struct MemoryClaimLedger {
    records: DashMap<(Uuid, Uuid), ClaimRecord>,
}

impl MemoryClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl ClaimLedger for MemoryClaimLedger {
    async fn put(&self, record: &ClaimRecord) -> Result<(), Error> {
        use dashmap::mapref::entry::Entry;
        match self
            .records
            .entry((record.event_id, record.participant_id))
        {
            Entry::Occupied(_) => Err(Error::DuplicateClaim {
                event_id: record.event_id,
                participant_id: record.participant_id,
            }),
            Entry::Vacant(v) => {
                v.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get_all(&self, event_id: Uuid) -> Result<Vec<ClaimRecord>, Error> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.key().0 == event_id)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// Event-metadata store fake. Status writes can be made to fail, for
/// exercising persistence-error paths.
#[derive(Default)]
pub struct MemoryEventRepository {
    events: DashMap<Uuid, ClaimEvent>,
    fail_status_writes: AtomicBool,
}

impl MemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status_write_failing(&self, failing: bool) {
        self.fail_status_writes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClaimEventRepository for MemoryEventRepository {
    async fn create_event(&self, event: &ClaimEvent) -> Result<(), Error> {
        self.events.insert(event.event_id, event.clone());
        Ok(())
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Option<ClaimEvent>, Error> {
        Ok(self.events.get(&event_id).map(|e| e.value().clone()))
    }

    async fn set_event_status(&self, event_id: Uuid, status: EventStatus) -> Result<(), Error> {
        if self.fail_status_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        match self.events.get_mut(&event_id) {
            Some(mut event) => {
                event.status = status;
                Ok(())
            }
            None => Err(Error::NotFound(format!("claim event {event_id}"))),
        }
    }

    async fn list_active_events(&self) -> Result<Vec<ClaimEvent>, Error> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.value().status == EventStatus::Active)
            .map(|e| e.value().clone())
            .collect())
    }
}

/// Delivery fake that records every handed-out code and can be flipped to
/// fail, for exercising the delivery-failure path.
#[derive(Default)]
pub struct RecordingDelivery {
    delivered: Mutex<Vec<(Uuid, String)>>,
    failing: AtomicBool,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<(Uuid, String)> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl AwardDelivery for RecordingDelivery {
    async fn deliver(
        &self,
        _channel: &str,
        participant_id: Uuid,
        code: &str,
    ) -> Result<(), Error> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Delivery("delivery channel unavailable".into()));
        }
        self.delivered
            .lock()
            .push((participant_id, code.to_string()));
        Ok(())
    }
}
