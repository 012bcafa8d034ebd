//! Delayed, cancellable ticket-channel deletion.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use ticketdesk_core::state_machine::CloseTrigger;
use ticketdesk_core::ChannelId;

use crate::platform::{PlatformError, TicketPlatform};

/// How hard to try deleting a channel once its countdown has run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Wait before the second attempt; doubled after each further failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Deletes `channel`, retrying transient failures. A channel that is already
/// gone counts as deleted.
pub async fn delete_with_retry(
    platform: &dyn TicketPlatform,
    channel: ChannelId,
    reason: &str,
    policy: RetryPolicy,
) -> Result<(), PlatformError> {
    let attempts = policy.attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1;

    loop {
        match platform.delete_channel(channel, reason).await {
            Ok(()) => return Ok(()),
            Err(PlatformError::NotFound) => {
                debug!("Channel {} was already deleted", channel);
                return Ok(());
            }
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(
                    "Deleting channel {} failed (attempt {}/{}): {}; retrying in {:?}",
                    channel, attempt, attempts, e, backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
        }
    }
}

struct PendingDeletion {
    id: u64,
    trigger: CloseTrigger,
    due_at: DateTime<Utc>,
    handle: AbortHandle,
}

/// A scheduled deletion, as reported on the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub channel: ChannelId,
    pub trigger: CloseTrigger,
    pub due_at: DateTime<Utc>,
}

/// Holds one pending deletion task per channel.
///
/// A channel with a pending entry is in the Closing state. The entry lives
/// until the task finishes or is cancelled.
#[derive(Default)]
pub struct DeletionScheduler {
    pending: Mutex<HashMap<ChannelId, PendingDeletion>>,
    next_id: AtomicU64,
}

impl DeletionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<ChannelId, PendingDeletion>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `task` after `delay`. Replaces (and aborts) an earlier schedule
    /// for the same channel.
    pub fn schedule<F>(self: &Arc<Self>, channel: ChannelId, trigger: CloseTrigger, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let due_at = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

        // Held across the spawn so the task cannot finish before it is registered.
        let mut pending = self.pending();
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
            scheduler.finish(channel, id);
        })
        .abort_handle();

        let previous = pending.insert(
            channel,
            PendingDeletion {
                id,
                trigger,
                due_at,
                handle,
            },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
        }
    }

    /// Aborts the pending deletion of `channel`, if any.
    pub fn cancel(&self, channel: ChannelId) -> bool {
        match self.pending().remove(&channel) {
            Some(deletion) => {
                deletion.handle.abort();
                true
            }
            None => false,
        }
    }

    fn finish(&self, channel: ChannelId, id: u64) {
        let mut pending = self.pending();
        if pending.get(&channel).map(|d| d.id) == Some(id) {
            pending.remove(&channel);
        }
    }

    pub fn is_pending(&self, channel: ChannelId) -> bool {
        self.pending().contains_key(&channel)
    }

    /// The trigger of the close that scheduled `channel`'s deletion.
    pub fn pending_trigger(&self, channel: ChannelId) -> Option<CloseTrigger> {
        self.pending().get(&channel).map(|d| d.trigger)
    }

    /// All pending deletions, soonest first.
    pub fn snapshot(&self) -> Vec<PendingSnapshot> {
        let mut entries: Vec<_> = self
            .pending()
            .iter()
            .map(|(channel, d)| PendingSnapshot {
                channel: *channel,
                trigger: d.trigger,
                due_at: d.due_at,
            })
            .collect();
        entries.sort_by_key(|e| (e.due_at, e.channel));
        entries
    }
}
