// codedrop-common/src/models/mod.rs

pub mod claim;
pub mod event;

pub use claim::{AwardStatus, ClaimOutcome, ClaimRecord, EventSummary};
pub use event::{ClaimEvent, EventStatus, DEFAULT_EVENT_DURATION_MS};
