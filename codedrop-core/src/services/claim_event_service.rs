use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use codedrop_common::error::Error;
use codedrop_common::models::{
    ClaimEvent, ClaimOutcome, EventStatus, DEFAULT_EVENT_DURATION_MS,
};
use codedrop_common::traits::repository_traits::{ClaimEventRepository, ClaimLedger};

use crate::eventbus::{AuditBus, AuditEvent, RejectReason};
use crate::pool::CodePool;
use crate::services::award_dispatcher::{AwardDispatcher, BulkAwardReport};
use crate::services::live_event::LiveEvent;
use crate::tasks::expiry::spawn_expiry_timer;

/// Registry of events currently accepting claims, shared with expiry timers.
pub type LiveRegistry = Arc<DashMap<Uuid, Arc<LiveEvent>>>;

/// What the admin surface hands us to open a claim window.
#[derive(Debug, Clone)]
pub struct PublishParams {
    pub title: String,
    pub description: String,
    /// Claim window length; defaults to 30 minutes when absent.
    pub duration_ms: Option<i64>,
    /// Newline-separated code file, read once at publish time.
    pub code_source: PathBuf,
    pub channel: String,
    pub created_by: Uuid,
}

/// Orchestrates claim events: publish, routing of claim attempts, expiry,
/// resume after restart, and bulk drops.
///
/// Holds the registry of live events; expired events are detached from it so
/// late attempts fall through to a state rejection.
pub struct ClaimEventService {
    events_repo: Arc<dyn ClaimEventRepository>,
    ledger: Arc<dyn ClaimLedger>,
    dispatcher: Arc<AwardDispatcher>,
    audit: AuditBus,
    live: LiveRegistry,
}

impl ClaimEventService {
    pub fn new(
        events_repo: Arc<dyn ClaimEventRepository>,
        ledger: Arc<dyn ClaimLedger>,
        dispatcher: Arc<AwardDispatcher>,
        audit: AuditBus,
    ) -> Self {
        Self {
            events_repo,
            ledger,
            dispatcher,
            audit,
            live: Arc::new(DashMap::new()),
        }
    }

    pub fn audit(&self) -> &AuditBus {
        &self.audit
    }

    /// Open a claim window: load the code pool, persist the event as Active,
    /// arm the expiry timer, and hand back the live handle.
    ///
    /// A missing or empty code source fails the publish with
    /// [`Error::CodeLoad`] before anything is persisted; the event never
    /// becomes Active.
    pub async fn publish(&self, params: PublishParams) -> Result<Arc<LiveEvent>, Error> {
        let duration_ms = params.duration_ms.unwrap_or(DEFAULT_EVENT_DURATION_MS);
        let event = ClaimEvent::new(
            &params.title,
            &params.description,
            duration_ms,
            &params.channel,
            params.created_by,
            &params.code_source.display().to_string(),
        );
        let event_id = event.event_id;

        let pool = CodePool::load(&params.code_source).await?;

        let live = Arc::new(LiveEvent::new(
            event,
            pool,
            self.ledger.clone(),
            self.events_repo.clone(),
            self.dispatcher.clone(),
            self.audit.clone(),
        ));
        live.activate().await?;

        self.live.insert(event_id, live.clone());
        spawn_expiry_timer(
            live.clone(),
            self.live.clone(),
            self.audit.shutdown_signal(),
            std::time::Duration::from_millis(duration_ms.max(0) as u64),
        );

        Ok(live)
    }

    pub fn get_live(&self, event_id: Uuid) -> Option<Arc<LiveEvent>> {
        self.live.get(&event_id).map(|e| e.value().clone())
    }

    /// Route a claim attempt from the delivery channel to its event.
    pub async fn on_claim_attempt(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> Result<ClaimOutcome, Error> {
        match self.get_live(event_id) {
            Some(live) => live.on_claim_attempt(participant_id).await,
            None => {
                // Expired events leave the registry, so this is the normal
                // late-attempt path; the rejection is still audited.
                self.audit
                    .publish(AuditEvent::ClaimRejected {
                        event_id,
                        participant_id,
                        reason: RejectReason::EventClosed,
                    })
                    .await;
                Err(Error::InvalidState(format!(
                    "event {event_id} is not accepting claims"
                )))
            }
        }
    }

    /// Close a window ahead of its timer. Idempotent: a second close (or the
    /// timer firing afterwards) finds nothing left to detach.
    pub async fn close(&self, event_id: Uuid) -> Result<(), Error> {
        let Some((_, live)) = self.live.remove(&event_id) else {
            return Ok(());
        };
        live.expire().await
    }

    /// Bring a persisted event back after a restart: rebuild the claim cache
    /// from ledger truth, reload and fast-forward the pool, and re-arm the
    /// expiry timer with whatever window is left (expiring immediately if the
    /// event is already past due).
    pub async fn resume(&self, event_id: Uuid) -> Result<Arc<LiveEvent>, Error> {
        let event = self
            .events_repo
            .get_event(event_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("claim event {event_id}")))?;

        if event.status == EventStatus::Expired {
            return Err(Error::InvalidState(format!(
                "event {event_id} already expired; nothing to resume"
            )));
        }

        let pool = CodePool::load(&event.code_source_ref).await?;
        let remaining = event.remaining_duration(Utc::now());

        let live = Arc::new(LiveEvent::new(
            event,
            pool,
            self.ledger.clone(),
            self.events_repo.clone(),
            self.dispatcher.clone(),
            self.audit.clone(),
        ));
        live.refresh_cache().await?;
        live.fast_forward_pool(live.claim_count());

        self.live.insert(event_id, live.clone());

        if remaining <= chrono::Duration::zero() {
            warn!("event {event_id} past due on resume; expiring now");
            self.close(event_id).await?;
        } else {
            info!(
                "resumed event {} with {} claims, {}ms left",
                event_id,
                live.claim_count(),
                remaining.num_milliseconds()
            );
            spawn_expiry_timer(
                live.clone(),
                self.live.clone(),
                self.audit.shutdown_signal(),
                std::time::Duration::from_millis(remaining.num_milliseconds().max(0) as u64),
            );
        }
        Ok(live)
    }

    /// Resume every event the repository still reports as Active.
    pub async fn resume_all(&self) -> Result<Vec<Arc<LiveEvent>>, Error> {
        let mut resumed = Vec::new();
        for event in self.events_repo.list_active_events().await? {
            resumed.push(self.resume(event.event_id).await?);
        }
        Ok(resumed)
    }

    /// Bulk drop: award one code each to a fixed roster, outside any claim
    /// window. The roster bypasses duplicate checks; the per-drop pool is
    /// validated to cover everyone before the first code leaves it.
    pub async fn drop_to_roster(
        &self,
        channel: &str,
        code_source: &std::path::Path,
        roster: &[Uuid],
    ) -> Result<BulkAwardReport, Error> {
        let pool = CodePool::load(code_source).await?;
        let drop_id = Uuid::new_v4();
        info!(
            "bulk drop {} to {} participants in {}",
            drop_id,
            roster.len(),
            channel
        );
        self.dispatcher
            .dispatch_bulk(drop_id, channel, &pool, roster)
            .await
    }
}
