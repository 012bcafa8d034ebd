//! In-memory index of open tickets, in front of the channel scan.
//!
//! The index is only a hint. A hit is verified against the platform before it
//! is trusted, and entries are dropped on every deletion path.

use std::collections::HashMap;

use tokio::sync::RwLock;

use ticketdesk_core::{ChannelId, TicketKey};

#[derive(Default)]
pub struct OpenTicketIndex {
    entries: RwLock<HashMap<TicketKey, ChannelId>>,
}

impl OpenTicketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &TicketKey) -> Option<ChannelId> {
        self.entries.read().await.get(key).copied()
    }

    pub async fn remember(&self, key: TicketKey, channel: ChannelId) {
        self.entries.write().await.insert(key, channel);
    }

    /// Drops `key` only if it still points at `channel`.
    pub async fn forget(&self, key: &TicketKey, channel: ChannelId) -> bool {
        let mut entries = self.entries.write().await;
        if entries.get(key) == Some(&channel) {
            entries.remove(key);
            true
        } else {
            false
        }
    }

    /// Drops whatever entry points at `channel`, for deletions we only know
    /// the channel id of.
    pub async fn forget_channel(&self, channel: ChannelId) -> Option<TicketKey> {
        let mut entries = self.entries.write().await;
        let key = entries
            .iter()
            .find(|(_, c)| **c == channel)
            .map(|(k, _)| k.clone())?;
        entries.remove(&key);
        Some(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketdesk_core::UserId;

    fn key(owner: u64, category: &str) -> TicketKey {
        TicketKey {
            owner: UserId(owner),
            category_key: category.to_string(),
        }
    }

    #[tokio::test]
    async fn test_remember_and_get() {
        let index = OpenTicketIndex::new();
        index.remember(key(1, "general"), ChannelId(10)).await;

        assert_eq!(index.get(&key(1, "general")).await, Some(ChannelId(10)));
        assert_eq!(index.get(&key(1, "unban")).await, None);
        assert_eq!(index.get(&key(2, "general")).await, None);
    }

    #[tokio::test]
    async fn test_forget_requires_matching_channel() {
        let index = OpenTicketIndex::new();
        index.remember(key(1, "general"), ChannelId(10)).await;

        assert!(!index.forget(&key(1, "general"), ChannelId(11)).await);
        assert_eq!(index.len().await, 1);
        assert!(index.forget(&key(1, "general"), ChannelId(10)).await);
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn test_forget_channel() {
        let index = OpenTicketIndex::new();
        index.remember(key(1, "general"), ChannelId(10)).await;
        index.remember(key(2, "general"), ChannelId(20)).await;

        assert_eq!(index.forget_channel(ChannelId(20)).await, Some(key(2, "general")));
        assert_eq!(index.forget_channel(ChannelId(20)).await, None);
        assert_eq!(index.get(&key(1, "general")).await, Some(ChannelId(10)));
    }
}
