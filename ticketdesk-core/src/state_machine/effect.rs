//! Effects (side effects as data).
//!
//! Effects describe what should happen as a result of a state transition.
//! The interpreter executes them against the chat platform.

use crate::access::Overwrite;
use crate::channel::TicketKey;
use crate::ids::{ChannelId, UserId};
use crate::messages::{Notice, Reply, Welcome};

use super::event::CloseTrigger;
use super::state::TicketRecord;

/// A ticket channel about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRequest {
    pub name: String,
    pub topic: String,
    pub parent: ChannelId,
    pub overwrites: Vec<Overwrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    // =========================================================================
    // Channel Effects
    // =========================================================================
    /// Create the ticket channel. Yields `ChannelCreated` or `PlatformFailed`.
    CreateChannel { request: ChannelRequest },

    /// Post the welcome message with the close button.
    PostWelcome { channel: ChannelId, welcome: Welcome },

    PostNotice { channel: ChannelId, notice: Notice },

    /// Look up `user` as a guild member and check their access to `channel`.
    /// Yields `MemberResolved`.
    ResolveMember {
        channel: ChannelId,
        user: UserId,
        by: UserId,
    },

    /// Add a member-level permission overwrite to the channel.
    GrantAccess {
        channel: ChannelId,
        overwrite: Overwrite,
        user: UserId,
        by: UserId,
    },

    /// Delete the channel after `delay_secs`. Completion is reported later,
    /// outside the current interaction.
    ScheduleDeletion {
        ticket: TicketRecord,
        delay_secs: u64,
        trigger: CloseTrigger,
    },

    // =========================================================================
    // Interaction Effects
    // =========================================================================
    /// Acknowledge now, answer later.
    Defer,

    Reply(Reply),

    // =========================================================================
    // Index Effects
    // =========================================================================
    RememberTicket { key: TicketKey, channel: ChannelId },

    ForgetTicket { key: TicketKey, channel: ChannelId },

    // =========================================================================
    // Logging Effects
    // =========================================================================
    Log { level: LogLevel, message: String },
}

impl Effect {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Effect::Log {
            level,
            message: message.into(),
        }
    }
}

/// Log level for logging effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}
