//! Engine: turns probe results into announcements
//!
//! The engine owns the only mutable piece of monitor state, the status the
//! last announcement was made for. Each cycle it probes the site, compares
//! the derived status with that value, and decides between three actions:
//!
//! * the status changed: announce it and make the new message the active one
//! * the status is unchanged and the active message still exists: do nothing
//! * the status is unchanged but the active message is gone (or was never
//!   recorded): announce the current status again
//!
//! The active message id is replaced by first clearing the old record and
//! then storing the new one. A replacement the store rejects is held in memory
//! and retried at the start of the next cycle; until it lands, the held id is
//! the one checked against the channel.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::Config;
use crate::notifier::{MessageId, Notification, Notifier};
use crate::probe::{ProbeResult, SiteProber};
use crate::status::MonitorStatus;
use crate::store::StateStore;

/// Pause between the end of one cycle and the start of the next
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// What a single cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The status changed and was announced. `message_id` is `None` when the send failed.
    Transitioned {
        from: MonitorStatus,
        to: MonitorStatus,
        message_id: Option<MessageId>,
    },
    /// The status held but its announcement was missing, so it was sent again
    Resent {
        status: MonitorStatus,
        message_id: Option<MessageId>,
    },
    /// The status held and its announcement still exists
    Unchanged { status: MonitorStatus },
}

impl CycleOutcome {
    /// Whether a send was attempted this cycle
    pub fn sent(&self) -> bool {
        !matches!(self, CycleOutcome::Unchanged { .. })
    }

    pub fn status(&self) -> MonitorStatus {
        match self {
            CycleOutcome::Transitioned { to, .. } => *to,
            CycleOutcome::Resent { status, .. } | CycleOutcome::Unchanged { status } => *status,
        }
    }
}

/// The engine reconciles probe results with the notifier and the state store
pub struct Engine {
    website_url: String,
    site_name: String,
    prober: Arc<dyn SiteProber>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    status: MonitorStatus,
    /// Record the store should hold but has not accepted yet.
    /// `Some(None)` means the old record still has to be cleared.
    pending: Option<Option<MessageId>>,
}

impl Engine {
    pub fn new(
        config: &Config,
        prober: Arc<dyn SiteProber>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            website_url: config.website_url.clone(),
            site_name: config.site_name.clone(),
            prober,
            notifier,
            store,
            clock,
            status: MonitorStatus::Unknown,
            pending: None,
        }
    }

    /// Status the last announcement was made for
    pub fn status(&self) -> MonitorStatus {
        self.status
    }

    /// Derive the starting status from the persisted message id.
    ///
    /// Only the id is persisted, so a message that still exists is taken to
    /// be an "Available" announcement. A missing message or an unreadable
    /// store leaves the status `Unknown`, which makes the first cycle announce.
    pub async fn seed(&mut self) -> MonitorStatus {
        match self.store.get_active_message_id().await {
            Ok(Some(message_id)) => {
                if self.message_exists(&message_id).await {
                    tracing::info!("Previous message exists with ID: {}", message_id);
                    self.status = MonitorStatus::Up;
                } else {
                    tracing::info!("Previous message {} no longer exists", message_id);
                }
            }
            Ok(None) => tracing::debug!("No previous message recorded"),
            Err(e) => tracing::warn!("Could not read previous message id: {}", e),
        }
        self.status
    }

    /// Probe the site once and reconcile the result
    pub async fn run_cycle(&mut self) -> crate::Result<CycleOutcome> {
        let result = self.prober.probe(&self.website_url).await;
        self.reconcile(&result).await
    }

    /// Apply one probe result to the state machine.
    ///
    /// A store error aborts the rest of the cycle. The in-memory status is
    /// updated before anything is persisted, so a transition is never
    /// announced twice because of a failed write.
    pub async fn reconcile(&mut self, result: &ProbeResult) -> crate::Result<CycleOutcome> {
        let current = result.status();
        let notification = self.notification_for(result);

        if let Some(record) = self.pending.take() {
            match self.record_active(record.as_ref()).await {
                Ok(()) => tracing::info!("State store caught up with the active message"),
                Err(e) => tracing::warn!("State store still rejecting writes: {}", e),
            }
        }

        if self.status != current {
            let previous = self.status;
            tracing::info!("Status changed: {} -> {}", previous, current);

            let message_id = self.announce(&notification).await;
            self.status = current;
            self.record_active(message_id.as_ref()).await?;

            return Ok(CycleOutcome::Transitioned {
                from: previous,
                to: current,
                message_id,
            });
        }

        let active = match &self.pending {
            Some(record) => record.clone(),
            None => self.store.get_active_message_id().await?,
        };
        let present = match &active {
            Some(message_id) => self.message_exists(message_id).await,
            None => false,
        };
        if present {
            tracing::debug!("Status {} unchanged and still announced", current);
            return Ok(CycleOutcome::Unchanged { status: current });
        }

        match &active {
            Some(message_id) => tracing::warn!(
                "Message {} for status {} is gone, announcing again",
                message_id,
                current
            ),
            None => tracing::warn!("No message recorded for status {}, announcing again", current),
        }

        let message_id = self.announce(&notification).await;
        self.record_active(message_id.as_ref()).await?;

        Ok(CycleOutcome::Resent {
            status: current,
            message_id,
        })
    }

    /// Poll until cancelled. Cancellation is only observed between cycles.
    pub async fn run(&mut self, cancel: CancellationToken) {
        loop {
            match self.run_cycle().await {
                Ok(outcome) => tracing::debug!("Cycle finished: {:?}", outcome),
                Err(e) => tracing::warn!("Cycle aborted: {}", e),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Polling loop cancelled");
                    break;
                }
                _ = self.clock.sleep(POLL_INTERVAL) => {}
            }
        }
    }

    fn notification_for(&self, result: &ProbeResult) -> Notification {
        let now = self.clock.now();
        match result {
            ProbeResult::Success => Notification::available(&self.site_name, now),
            ProbeResult::Failure(failure) => {
                Notification::reporting_error(&self.site_name, failure, now)
            }
        }
    }

    /// Best-effort send; a failure is logged and yields no id
    async fn announce(&self, notification: &Notification) -> Option<MessageId> {
        match self.notifier.send(notification).await {
            Ok(message_id) => Some(message_id),
            Err(e) => {
                tracing::error!(
                    "Failed to send {} message '{}': {}",
                    self.notifier.type_name(),
                    notification.title,
                    e
                );
                None
            }
        }
    }

    /// Any fetch error counts as "gone" so the announcement gets repaired
    async fn message_exists(&self, message_id: &MessageId) -> bool {
        match self.notifier.exists(message_id).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(
                    "Could not fetch message {}, treating it as gone: {}",
                    message_id,
                    e
                );
                false
            }
        }
    }

    /// Persist the new record, or hold it for the next cycle if the store fails
    async fn record_active(&mut self, message_id: Option<&MessageId>) -> crate::Result<()> {
        match self.replace_active_message(message_id).await {
            Ok(()) => {
                self.pending = None;
                Ok(())
            }
            Err(e) => {
                self.pending = Some(message_id.cloned());
                Err(e)
            }
        }
    }

    async fn replace_active_message(&self, message_id: Option<&MessageId>) -> crate::Result<()> {
        if let Some(old) = self.store.get_active_message_id().await? {
            self.store.clear_active_message_id().await?;
            tracing::info!("Old Message ID {} removed from the database.", old);
        }
        if let Some(message_id) = message_id {
            self.store.set_active_message_id(message_id).await?;
            tracing::info!("Message ID {} added to the database.", message_id);
        }
        Ok(())
    }
}
