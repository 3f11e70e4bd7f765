// File: src/services/live_event.rs

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use codedrop_common::error::Error;
use codedrop_common::models::{
    AwardStatus, ClaimEvent, ClaimOutcome, ClaimRecord, EventStatus, EventSummary,
};
use codedrop_common::traits::repository_traits::{ClaimEventRepository, ClaimLedger};

use crate::cache::ClaimCache;
use crate::eventbus::{AuditBus, AuditEvent, AwardFailure, RejectReason};
use crate::pool::CodePool;
use crate::services::award_dispatcher::AwardDispatcher;

/// A claim event together with everything needed to serve attempts against
/// it: the code pool, the ledger mirror, and the guarded status word.
///
/// Status transitions are monotonic (Pending -> Active -> Expired) and
/// `expire` is idempotent. `on_claim_attempt` re-checks the status gate after
/// the ledger commit, so attempts racing the expiry timer resolve
/// deterministically: either a normal award, or a clean no-award rejection of
/// an already-recorded claim. Never a dispensed-but-unrecorded code.
pub struct LiveEvent {
    event: ClaimEvent,
    status: RwLock<EventStatus>,
    pool: CodePool,
    cache: ClaimCache,
    ledger: Arc<dyn ClaimLedger>,
    events_repo: Arc<dyn ClaimEventRepository>,
    dispatcher: Arc<AwardDispatcher>,
    audit: AuditBus,
}

impl std::fmt::Debug for LiveEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveEvent")
            .field("event_id", &self.event.event_id)
            .field("status", &*self.status.read())
            .finish_non_exhaustive()
    }
}

impl LiveEvent {
    pub(crate) fn new(
        event: ClaimEvent,
        pool: CodePool,
        ledger: Arc<dyn ClaimLedger>,
        events_repo: Arc<dyn ClaimEventRepository>,
        dispatcher: Arc<AwardDispatcher>,
        audit: AuditBus,
    ) -> Self {
        let status = event.status;
        Self {
            event,
            status: RwLock::new(status),
            pool,
            cache: ClaimCache::new(),
            ledger,
            events_repo,
            dispatcher,
            audit,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event.event_id
    }

    pub fn title(&self) -> &str {
        &self.event.title
    }

    pub fn status(&self) -> EventStatus {
        *self.status.read()
    }

    /// Live claim count, for display.
    pub fn claim_count(&self) -> usize {
        self.cache.size()
    }

    /// Codes left in the pool, for display.
    pub fn remaining_codes(&self) -> usize {
        self.pool.remaining()
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            total_claims: self.cache.size(),
            remaining_codes: self.pool.remaining(),
        }
    }

    /// Event metadata with the current status filled in.
    pub fn snapshot(&self) -> ClaimEvent {
        let mut event = self.event.clone();
        event.status = self.status();
        event
    }

    /// Pending -> Active: persist the event record and announce the window.
    ///
    /// Only called from publish; the pool is already loaded by then, so a bad
    /// code source has failed the publish before anything was persisted.
    pub(crate) async fn activate(&self) -> Result<(), Error> {
        {
            let mut status = self.status.write();
            if !status.can_transition_to(EventStatus::Active) {
                return Err(Error::InvalidState(format!(
                    "cannot activate event {} from state {:?}",
                    self.event.event_id, *status
                )));
            }
            *status = EventStatus::Active;
        }

        self.events_repo.create_event(&self.snapshot()).await?;

        info!(
            "event {} ('{}') active with {} codes, expires {}",
            self.event.event_id,
            self.event.title,
            self.pool.remaining(),
            self.event.expires_at
        );
        self.audit
            .publish(AuditEvent::EventStarted {
                event_id: self.event.event_id,
                title: self.event.title.clone(),
                expires_at: self.event.expires_at,
            })
            .await;
        Ok(())
    }

    /// One participant's claim attempt. Valid only while Active.
    ///
    /// Flow: cache pre-filter, ledger write (the authoritative duplicate
    /// check), post-commit status re-check, then dispense and dispatch.
    pub async fn on_claim_attempt(&self, participant_id: Uuid) -> Result<ClaimOutcome, Error> {
        let event_id = self.event.event_id;

        if self.status() != EventStatus::Active {
            self.audit
                .publish(AuditEvent::ClaimRejected {
                    event_id,
                    participant_id,
                    reason: RejectReason::EventClosed,
                })
                .await;
            return Err(Error::InvalidState(format!(
                "event {event_id} is not accepting claims"
            )));
        }

        // Fast pre-filter only; the ledger below is the authority.
        if self.cache.has(participant_id) {
            debug!(
                "duplicate claim (cache) by {} on event {}",
                participant_id, event_id
            );
            self.audit
                .publish(AuditEvent::ClaimRejected {
                    event_id,
                    participant_id,
                    reason: RejectReason::Duplicate,
                })
                .await;
            return Err(Error::DuplicateClaim {
                event_id,
                participant_id,
            });
        }

        let record = ClaimRecord::new(event_id, participant_id);
        match self.ledger.put(&record).await {
            Ok(()) => {}
            Err(err @ Error::DuplicateClaim { .. }) => {
                // A concurrent attempt by the same participant won the race;
                // bring the mirror back in line with ledger truth.
                self.refresh_cache().await?;
                debug!(
                    "duplicate claim (ledger) by {} on event {}",
                    participant_id, event_id
                );
                self.audit
                    .publish(AuditEvent::ClaimRejected {
                        event_id,
                        participant_id,
                        reason: RejectReason::Duplicate,
                    })
                    .await;
                return Err(err);
            }
            Err(e) => return Err(e),
        }

        // The mirror only ever reflects committed ledger writes.
        self.cache.record(record.clone());
        self.audit
            .publish(AuditEvent::ClaimAccepted {
                event_id,
                participant_id,
                claimed_at: record.claimed_at,
            })
            .await;

        // Expiry may have landed while the write was in flight. The claim
        // stands, but no code may leave the pool after the window closes.
        if self.status() != EventStatus::Active {
            warn!(
                "event {} expired mid-claim; claim by {} recorded, no award",
                event_id, participant_id
            );
            self.audit
                .publish(AuditEvent::ClaimRejected {
                    event_id,
                    participant_id,
                    reason: RejectReason::EventClosed,
                })
                .await;
            return Err(Error::InvalidState(format!(
                "event {event_id} expired before a code could be dispensed"
            )));
        }

        let code = match self.pool.dispense() {
            Ok(code) => code,
            Err(Error::PoolExhausted) => {
                // Registered claims are never retracted for lack of inventory.
                info!(
                    "pool exhausted on event {}; claim by {} recorded without award",
                    event_id, participant_id
                );
                self.audit
                    .publish(AuditEvent::AwardFailed {
                        event_id,
                        participant_id,
                        reason: AwardFailure::Exhausted,
                    })
                    .await;
                return Ok(ClaimOutcome {
                    record,
                    code: None,
                    award: AwardStatus::PoolExhausted,
                });
            }
            Err(e) => return Err(e),
        };

        let award = self
            .dispatcher
            .dispatch(event_id, &self.event.channel, participant_id, &code)
            .await;

        Ok(ClaimOutcome {
            record,
            code: Some(code),
            award,
        })
    }

    /// Active -> Expired. Idempotent: calling again is a no-op with the same
    /// final state and no second summary.
    ///
    /// The repo write happens before the in-memory flip, so a failed write
    /// leaves the event expirable again instead of stranding the row as
    /// active with no summary ever emitted.
    pub async fn expire(&self) -> Result<(), Error> {
        if self.status() == EventStatus::Expired {
            debug!("event {} already expired", self.event.event_id);
            return Ok(());
        }

        self.events_repo
            .set_event_status(self.event.event_id, EventStatus::Expired)
            .await?;

        {
            let mut status = self.status.write();
            // A concurrent expire may have won between the persist and here;
            // the repo write is idempotent and only the winner reports.
            if *status == EventStatus::Expired {
                return Ok(());
            }
            *status = EventStatus::Expired;
        }

        let summary = self.summary();
        info!(
            "event {} ('{}') ended: {} claims, {} codes left",
            self.event.event_id, self.event.title, summary.total_claims, summary.remaining_codes
        );
        self.audit
            .publish(AuditEvent::EventEnded {
                event_id: self.event.event_id,
                summary,
            })
            .await;
        Ok(())
    }

    /// Reload the mirror from ledger truth.
    pub async fn refresh_cache(&self) -> Result<(), Error> {
        let records = self.ledger.get_all(self.event.event_id).await?;
        self.cache.rebuild(records);
        Ok(())
    }

    /// Skip codes that left the pool before a restart. Best effort: claims
    /// that went unawarded (exhaustion, mid-expiry) cannot be told apart from
    /// awarded ones, since the code file is only ever read front to back.
    pub(crate) fn fast_forward_pool(&self, n: usize) {
        self.pool.fast_forward(n);
    }
}
