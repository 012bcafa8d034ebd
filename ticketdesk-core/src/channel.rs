//! Live channels as seen through the platform, and how tickets are recognised
//! among them.

use crate::category::Category;
use crate::ids::{ChannelId, UserId};
use crate::naming::has_ticket_prefix;
use crate::topic::TicketTopic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    /// A channel category, i.e. a grouping other channels can live under.
    Category,
    Other,
}

/// The platform-independent view of a guild channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
    pub topic: Option<String>,
    pub parent: Option<ChannelId>,
}

/// Uniqueness key: at most one open ticket per owner and category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketKey {
    pub owner: UserId,
    pub category_key: String,
}

impl TicketKey {
    pub fn new(owner: UserId, category: &Category) -> Self {
        Self {
            owner,
            category_key: category.key.clone(),
        }
    }
}

/// A channel that passed the ticket test, with its decoded topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketChannel {
    pub id: ChannelId,
    pub name: String,
    pub topic: TicketTopic,
}

impl TicketChannel {
    /// Returns `Some` only for text channels with the ticket name prefix whose
    /// topic decodes as a ticket record. Both tests must hold.
    pub fn recognise(channel: &ChannelSnapshot) -> Option<Self> {
        if channel.kind != ChannelKind::Text || !has_ticket_prefix(&channel.name) {
            return None;
        }
        let topic = TicketTopic::decode(channel.topic.as_deref()?).ok()?;
        Some(Self {
            id: channel.id,
            name: channel.name.clone(),
            topic,
        })
    }

    pub fn is_open_ticket_of(&self, owner: UserId, category: &Category) -> bool {
        self.topic.belongs_to(owner) && self.topic.is_category(category)
    }
}

pub fn is_ticket_channel(channel: &ChannelSnapshot) -> bool {
    TicketChannel::recognise(channel).is_some()
}

/// Linear scan for an existing ticket of `owner` in `category`.
pub fn find_open_ticket(
    channels: &[ChannelSnapshot],
    owner: UserId,
    category: &Category,
) -> Option<TicketChannel> {
    channels
        .iter()
        .filter_map(TicketChannel::recognise)
        .find(|ticket| ticket.is_open_ticket_of(owner, category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::test_registry;
    use crate::ids::UserRef;
    use crate::naming::channel_name;

    fn ticket_snapshot(id: u64, owner: &UserRef, category: &Category) -> ChannelSnapshot {
        ChannelSnapshot {
            id: ChannelId(id),
            name: channel_name(owner, category),
            kind: ChannelKind::Text,
            topic: Some(TicketTopic::new(owner, category).encode()),
            parent: Some(category.grouping),
        }
    }

    fn plain(id: u64, name: &str, topic: Option<&str>) -> ChannelSnapshot {
        ChannelSnapshot {
            id: ChannelId(id),
            name: name.to_string(),
            kind: ChannelKind::Text,
            topic: topic.map(str::to_string),
            parent: None,
        }
    }

    #[test]
    fn test_created_channel_is_a_ticket() {
        let registry = test_registry();
        let owner = UserRef::new(42u64, "alice", "alice");
        let channel = ticket_snapshot(1, &owner, registry.get("general").unwrap());
        assert!(is_ticket_channel(&channel));
    }

    #[test]
    fn test_both_name_and_topic_are_required() {
        let topic = "Ticket owner: alice (42) | kategori: General | key: general";
        assert!(!is_ticket_channel(&plain(1, "general-chat", Some(topic))));
        assert!(!is_ticket_channel(&plain(2, "ticket-general-alice-42", None)));
        assert!(!is_ticket_channel(&plain(
            3,
            "ticket-general-alice-42",
            Some("Owner: alice")
        )));
        assert!(is_ticket_channel(&plain(4, "ticket-general-alice-42", Some(topic))));

        let mut voice = plain(5, "ticket-general-alice-42", Some(topic));
        voice.kind = ChannelKind::Other;
        assert!(!is_ticket_channel(&voice));
    }

    #[test]
    fn test_find_open_ticket_matches_owner_and_category() {
        let registry = test_registry();
        let general = registry.get("general").unwrap();
        let unban = registry.get("unban").unwrap();
        let alice = UserRef::new(42u64, "alice", "alice");
        let bob = UserRef::new(43u64, "bob", "bob");

        let channels = vec![
            plain(1, "lobby", None),
            ticket_snapshot(2, &bob, general),
            ticket_snapshot(3, &alice, unban),
        ];

        assert_eq!(find_open_ticket(&channels, alice.id, general), None);
        assert_eq!(
            find_open_ticket(&channels, alice.id, unban).map(|t| t.id),
            Some(ChannelId(3))
        );
        assert_eq!(
            find_open_ticket(&channels, bob.id, general).map(|t| t.id),
            Some(ChannelId(2))
        );
    }

    #[test]
    fn test_owner_id_is_matched_exactly() {
        // Substring matching would have treated user 4 as the owner of user 42's ticket.
        let registry = test_registry();
        let general = registry.get("general").unwrap();
        let owner = UserRef::new(42u64, "alice", "alice");
        let channels = vec![ticket_snapshot(1, &owner, general)];
        assert_eq!(find_open_ticket(&channels, UserId(4), general), None);
        assert_eq!(find_open_ticket(&channels, UserId(2), general), None);
    }
}
