use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::services::claim_event_service::LiveRegistry;
use crate::services::live_event::LiveEvent;

/// Arms the expiry timer for a published event.
///
/// When the duration elapses the event is detached from the live registry and
/// expired; `expire` is idempotent, so an explicit admin close racing the
/// timer is harmless. A bus shutdown cancels the timer and leaves the event
/// live in storage for a later resume.
pub fn spawn_expiry_timer(
    live: Arc<LiveEvent>,
    registry: LiveRegistry,
    mut shutdown_rx: watch::Receiver<bool>,
    duration: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event_id = live.event_id();
        tokio::select! {
            _ = tokio::time::sleep(duration) => {
                debug!("expiry timer elapsed for event {event_id}");
                registry.remove(&event_id);
                if let Err(e) = live.expire().await {
                    error!("failed to expire event {event_id}: {e:?}");
                }
            }
            _ = shutdown_rx.changed() => {
                info!("shutdown before expiry of event {event_id}; leaving it live in storage");
            }
        }
    })
}
