//! The chat-platform seam.
//!
//! Everything the ticket desk needs from the platform goes through
//! [`TicketPlatform`] (guild-level calls) and [`Responder`] (answering the
//! interaction that triggered the work). The serenity adapters live in
//! `discord`; tests use an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use ticketdesk_core::access::Overwrite;
use ticketdesk_core::state_machine::ChannelRequest;
use ticketdesk_core::{ChannelId, ChannelSnapshot, Notice, Panel, Reply, UserId, Welcome};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The channel, member or message does not exist (HTTP 404).
    #[error("not found")]
    NotFound,
    #[error("platform API error: {0}")]
    Api(String),
}

impl PlatformError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound)
    }
}

/// Guild-scoped platform calls.
#[async_trait]
pub trait TicketPlatform: Send + Sync {
    async fn guild_name(&self) -> Result<String, PlatformError>;

    async fn list_channels(&self) -> Result<Vec<ChannelSnapshot>, PlatformError>;

    async fn get_channel(&self, channel: ChannelId) -> Result<ChannelSnapshot, PlatformError>;

    async fn create_channel(&self, request: &ChannelRequest) -> Result<ChannelId, PlatformError>;

    async fn post_welcome(&self, channel: ChannelId, welcome: &Welcome)
        -> Result<(), PlatformError>;

    async fn post_notice(&self, channel: ChannelId, notice: &Notice) -> Result<(), PlatformError>;

    async fn post_panel(&self, channel: ChannelId, panel: &Panel) -> Result<(), PlatformError>;

    /// Whether `user` can currently view `channel`. `NotFound` when the user
    /// is not a member of the guild.
    async fn member_can_view(&self, channel: ChannelId, user: UserId)
        -> Result<bool, PlatformError>;

    async fn grant_access(
        &self,
        channel: ChannelId,
        overwrite: &Overwrite,
    ) -> Result<(), PlatformError>;

    async fn delete_channel(&self, channel: ChannelId, reason: &str) -> Result<(), PlatformError>;
}

/// Answers the interaction being handled. Every answer is private to the
/// invoking user.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Acknowledge without content; the next `reply` fills it in.
    async fn defer(&self) -> Result<(), PlatformError>;

    async fn reply(&self, reply: &Reply) -> Result<(), PlatformError>;
}
