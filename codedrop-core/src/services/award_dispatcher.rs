use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use codedrop_common::error::Error;
use codedrop_common::models::AwardStatus;

use crate::eventbus::{AuditBus, AuditEvent, AwardFailure};
use crate::pool::CodePool;

/// Seam to the external notification channel (DM, webhook, whatever actually
/// reaches a participant). The core issues no retries through this and stays
/// agnostic to message formatting.
#[async_trait]
pub trait AwardDelivery: Send + Sync {
    async fn deliver(
        &self,
        channel: &str,
        participant_id: Uuid,
        code: &str,
    ) -> Result<(), Error>;
}

/// Pairs a participant with a dispensed code and attempts delivery.
pub struct AwardDispatcher {
    delivery: Arc<dyn AwardDelivery>,
    audit: AuditBus,
}

/// Per-participant outcome of a bulk drop.
#[derive(Debug, Default, Clone)]
pub struct BulkAwardReport {
    pub awarded: Vec<Uuid>,
    pub not_awarded: Vec<Uuid>,
}

impl AwardDispatcher {
    pub fn new(delivery: Arc<dyn AwardDelivery>, audit: AuditBus) -> Self {
        Self { delivery, audit }
    }

    /// Hand a dispensed code to a participant.
    ///
    /// The code is consumed whether or not delivery succeeds; a failure is
    /// audited, never refunded to the pool.
    pub async fn dispatch(
        &self,
        event_id: Uuid,
        channel: &str,
        participant_id: Uuid,
        code: &str,
    ) -> AwardStatus {
        match self.delivery.deliver(channel, participant_id, code).await {
            Ok(()) => {
                self.audit
                    .publish(AuditEvent::AwardDelivered {
                        event_id,
                        participant_id,
                    })
                    .await;
                AwardStatus::Delivered
            }
            Err(e) => {
                error!(
                    "award delivery failed for participant {} in event {}: {}",
                    participant_id, event_id, e
                );
                self.audit
                    .publish(AuditEvent::AwardFailed {
                        event_id,
                        participant_id,
                        reason: AwardFailure::Delivery(e.to_string()),
                    })
                    .await;
                AwardStatus::DeliveryFailed
            }
        }
    }

    /// Bulk drop: one code per roster member, outside any claim window.
    ///
    /// Refuses to start unless the pool covers the whole roster, so a short
    /// pool never awards a partial prefix. Delivery failures still consume
    /// their code and land in `not_awarded`.
    pub async fn dispatch_bulk(
        &self,
        drop_id: Uuid,
        channel: &str,
        pool: &CodePool,
        roster: &[Uuid],
    ) -> Result<BulkAwardReport, Error> {
        if roster.is_empty() {
            return Err(Error::Delivery("bulk drop roster is empty".into()));
        }
        if pool.remaining() < roster.len() {
            return Err(Error::PoolExhausted);
        }

        let mut report = BulkAwardReport::default();
        for &participant_id in roster {
            let code = pool.dispense()?;
            match self.dispatch(drop_id, channel, participant_id, &code).await {
                AwardStatus::Delivered => report.awarded.push(participant_id),
                _ => report.not_awarded.push(participant_id),
            }
        }

        info!(
            "bulk drop {}: {}/{} awarded",
            drop_id,
            report.awarded.len(),
            roster.len()
        );
        Ok(report)
    }
}
