// File: codedrop-common/src/models/claim.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One accepted claim, keyed by (event_id, participant_id).
///
/// Exactly one record per key ever exists in the ledger; a second write for
/// the same key is rejected, never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub event_id: Uuid,
    pub participant_id: Uuid,
    pub claimed: bool,
    pub claimed_at: DateTime<Utc>,
}

impl ClaimRecord {
    pub fn new(event_id: Uuid, participant_id: Uuid) -> Self {
        Self {
            event_id,
            participant_id,
            claimed: true,
            claimed_at: Utc::now(),
        }
    }
}

/// Final tally emitted when an event expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub total_claims: usize,
    pub remaining_codes: usize,
}

/// Outcome of the award half of an accepted claim.
///
/// A dispensed code is permanently consumed regardless of delivery outcome,
/// and a registered claim is never retracted for lack of inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwardStatus {
    Delivered,
    DeliveryFailed,
    /// The claim was ledger-recorded but the pool was already empty.
    PoolExhausted,
}

/// Returned to the caller when a claim attempt lands in the ledger.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    pub record: ClaimRecord,
    pub code: Option<String>,
    pub award: AwardStatus,
}
