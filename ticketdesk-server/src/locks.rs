//! Per-ticket-key mutual exclusion for ticket creation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use ticketdesk_core::TicketKey;

/// Serializes creates for the same (owner, category) so two near-simultaneous
/// requests cannot both pass the duplicate guard.
#[derive(Default)]
pub struct KeyedLocks {
    locks: RwLock<HashMap<TicketKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_or_create(&self, key: &TicketKey) -> Arc<Mutex<()>> {
        // Fast path: check if lock already exists
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(key) {
                return lock.clone();
            }
        }

        // Slow path: create lock (double-check after acquiring write lock).
        // Entries nobody holds or waits on are dropped here, so the map stays
        // bounded by the keys in flight.
        let mut locks = self.locks.write().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of tracked keys, idle ones included until the next prune.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Waits for exclusive use of `key`. Released when the guard drops.
    pub async fn lock(&self, key: &TicketKey) -> OwnedMutexGuard<()> {
        self.get_or_create(key).await.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use ticketdesk_core::UserId;

    fn key(owner: u64) -> TicketKey {
        TicketKey {
            owner: UserId(owner),
            category_key: "general".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock(&key(1)).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&key(1)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = KeyedLocks::new();
        for owner in 0..10 {
            drop(locks.lock(&key(owner)).await);
        }
        assert_eq!(locks.len().await, 1);

        let held = locks.lock(&key(100)).await;
        let _next = locks.lock(&key(101)).await;
        assert_eq!(locks.len().await, 2);
        drop(held);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _first = locks.lock(&key(1)).await;
        let _second = locks.lock(&key(2)).await;
    }
}
