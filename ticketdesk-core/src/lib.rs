//! Core model for the ticket desk: everything that can be decided without
//! talking to the chat platform.
//!
//! The server crate owns all I/O. This crate owns the category table, the
//! channel-name and topic encodings that double as the ticket's persistent
//! record, the access predicates, and the lifecycle state machine.

pub mod access;
pub mod category;
pub mod channel;
pub mod ids;
pub mod messages;
pub mod naming;
pub mod policy;
pub mod state_machine;
pub mod topic;

pub use category::{Category, CategoryRegistry, CategoryTemplate, RegistryError, BUILTIN_CATEGORIES};
pub use channel::{find_open_ticket, is_ticket_channel, ChannelKind, ChannelSnapshot, TicketChannel, TicketKey};
pub use ids::{ChannelId, RoleId, UserId, UserRef};
pub use messages::{Notice, Panel, PanelEntry, Reply, Tone, Welcome};
pub use naming::{channel_name, TICKET_CHANNEL_PREFIX};
pub use policy::{can_add_collaborator, can_close, has_staff_capability, Actor, MemberStanding};
pub use topic::{TicketTopic, TopicError};
