// File: src/services/mod.rs

pub mod award_dispatcher;
pub mod claim_event_service;
pub mod live_event;

pub use award_dispatcher::{AwardDelivery, AwardDispatcher, BulkAwardReport};
pub use claim_event_service::{ClaimEventService, PublishParams};
pub use live_event::LiveEvent;
