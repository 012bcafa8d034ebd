//! Ticket lifecycle states.

use crate::category::{Category, CategoryRegistry};
use crate::channel::{TicketChannel, TicketKey};
use crate::ids::{ChannelId, RoleId, UserRef};
use crate::topic::TicketTopic;

use super::event::CloseTrigger;

/// Everything needed to provision a ticket channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub owner: UserRef,
    pub category: Category,
    /// Channel category the ticket is created under, already resolved.
    pub parent: ChannelId,
    pub subject: Option<String>,
    /// Role mentioned in the welcome message.
    pub mention_role: RoleId,
}

impl CreateRequest {
    pub fn key(&self) -> TicketKey {
        TicketKey::new(self.owner.id, &self.category)
    }
}

/// A live ticket channel and the record in its topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    pub channel: ChannelId,
    pub key: TicketKey,
    pub topic: TicketTopic,
}

impl TicketRecord {
    pub fn new(channel: ChannelId, topic: TicketTopic, category: &Category) -> Self {
        Self {
            channel,
            key: TicketKey::new(topic.owner_id, category),
            topic,
        }
    }

    /// Rebuilds the record of a recognised ticket channel.
    ///
    /// Topics without a key field are matched to a category by label. A label
    /// that no longer names a configured category is kept verbatim as the key.
    pub fn from_channel(ticket: &TicketChannel, registry: &CategoryRegistry) -> Self {
        let category_key = match &ticket.topic.category_key {
            Some(key) => key.clone(),
            None => registry
                .by_label(&ticket.topic.category_label)
                .map(|c| c.key.clone())
                .unwrap_or_else(|| ticket.topic.category_label.clone()),
        };
        Self {
            channel: ticket.id,
            key: TicketKey {
                owner: ticket.topic.owner_id,
                category_key,
            },
            topic: ticket.topic.clone(),
        }
    }

    pub fn label(&self) -> &str {
        &self.topic.category_label
    }
}

/// Lifecycle of a single ticket.
///
/// `Absent -> Provisioning -> Open -> Closing -> Deleted`. `Closing` can fall
/// back to `Open` when the countdown notice cannot be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketState {
    /// No ticket channel exists (or the invoking channel is not one).
    Absent,
    /// The channel-create call is in flight.
    Provisioning { request: CreateRequest },
    Open(TicketRecord),
    /// Close accepted; deletion is pending.
    Closing {
        ticket: TicketRecord,
        trigger: CloseTrigger,
    },
    Deleted { channel: ChannelId },
}

impl TicketState {
    pub fn name(&self) -> &'static str {
        match self {
            TicketState::Absent => "absent",
            TicketState::Provisioning { .. } => "provisioning",
            TicketState::Open(_) => "open",
            TicketState::Closing { .. } => "closing",
            TicketState::Deleted { .. } => "deleted",
        }
    }

    pub fn record(&self) -> Option<&TicketRecord> {
        match self {
            TicketState::Open(ticket) | TicketState::Closing { ticket, .. } => Some(ticket),
            _ => None,
        }
    }
}
