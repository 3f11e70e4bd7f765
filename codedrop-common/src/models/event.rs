// File: codedrop-common/src/models/event.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Duration used when the admin surface supplies none (30 minutes).
pub const DEFAULT_EVENT_DURATION_MS: i64 = 30 * 60 * 1000;

/// Lifecycle states of a claim event.
///
/// Transitions are monotonic: Pending -> Active -> Expired. Expired is
/// terminal; nothing ever moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Active,
    Expired,
}

impl EventStatus {
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Pending, Active) | (Active, Expired) | (Pending, Expired)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Active => "active",
            EventStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "active" => Ok(EventStatus::Active),
            "expired" => Ok(EventStatus::Expired),
            other => Err(format!("unknown event status '{other}'")),
        }
    }
}

/// A time-bounded window in which each participant may redeem at most one
/// reward code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimEvent {
    pub event_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub expires_at: DateTime<Utc>,
    pub status: EventStatus,
    /// Reference to the delivery channel the event was announced in.
    pub channel: String,
    pub created_by: Uuid,
    /// Where the codes were loaded from, kept for display and resume.
    pub code_source_ref: String,
}

impl ClaimEvent {
    pub fn new(
        title: &str,
        description: &str,
        duration_ms: i64,
        channel: &str,
        created_by: Uuid,
        code_source_ref: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            event_id: Uuid::new_v4(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            created_at: now,
            duration_ms,
            expires_at: now + Duration::milliseconds(duration_ms),
            status: EventStatus::Pending,
            channel: channel.to_string(),
            created_by,
            code_source_ref: code_source_ref.to_string(),
        }
    }

    /// Time left in the claim window; non-positive means past due.
    pub fn remaining_duration(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}
