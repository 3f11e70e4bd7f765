// File: codedrop-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{ClaimEvent, ClaimRecord, EventStatus};

/// Persistence for event metadata.
#[async_trait]
pub trait ClaimEventRepository: Send + Sync {
    async fn create_event(&self, event: &ClaimEvent) -> Result<(), Error>;
    async fn get_event(&self, event_id: Uuid) -> Result<Option<ClaimEvent>, Error>;
    async fn set_event_status(&self, event_id: Uuid, status: EventStatus) -> Result<(), Error>;
    async fn list_active_events(&self) -> Result<Vec<ClaimEvent>, Error>;
}

/// Durable, write-once store of accepted claims.
///
/// The per-key uniqueness constraint is the single source of truth for
/// "has this participant already claimed": of N concurrent puts for the same
/// (event, participant) key, exactly one may succeed.
#[async_trait]
pub trait ClaimLedger: Send + Sync {
    /// Persists `record`. A second put for the same key must fail with
    /// [`Error::DuplicateClaim`], never overwrite.
    async fn put(&self, record: &ClaimRecord) -> Result<(), Error>;

    /// All records for an event, used to rebuild the claim cache on resume.
    async fn get_all(&self, event_id: Uuid) -> Result<Vec<ClaimRecord>, Error>;
}
