//! Events that drive state transitions.
//!
//! Requests come from interactions; the rest are reported back by the
//! interpreter after it has executed an effect.

use crate::ids::{ChannelId, UserId};
use crate::messages::Notice;
use crate::policy::Actor;

use super::state::CreateRequest;

/// How a close was triggered. Only affects wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    Command,
    Button,
}

impl CloseTrigger {
    /// Audit-log reason attached to the channel deletion.
    pub fn deletion_reason(&self) -> &'static str {
        match self {
            CloseTrigger::Command => "Ticket lukket via command",
            CloseTrigger::Button => "Ticket lukket via knap",
        }
    }
}

/// The member a staff user wants to add, as looked up in the guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddTarget {
    /// The user is not a member of the guild.
    NotAMember,
    Member {
        user: UserId,
        /// Already allowed to view the ticket channel.
        can_view: bool,
    },
}

/// A platform call that produces an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateChannel,
    PostWelcome,
    PostNotice,
    ResolveMember,
    GrantAccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // =========================================================================
    // Requests
    // =========================================================================
    CreateRequested {
        request: CreateRequest,
    },

    CloseRequested {
        actor: Actor,
        trigger: CloseTrigger,
        delay_secs: u64,
    },

    AddMemberRequested {
        actor: Actor,
        user: UserId,
    },

    // =========================================================================
    // Platform results
    // =========================================================================
    MemberResolved {
        target: AddTarget,
        by: UserId,
    },

    ChannelCreated {
        channel: ChannelId,
    },

    WelcomePosted,

    NoticePosted {
        notice: Notice,
    },

    AccessGranted {
        user: UserId,
        by: UserId,
    },

    PlatformFailed {
        operation: Operation,
        error: String,
    },

    /// The channel is gone, either deleted by us or already missing.
    DeletionCompleted,

    /// Every deletion attempt failed.
    DeletionFailed {
        error: String,
    },
}

impl Event {
    /// Returns a summary of the event suitable for logging.
    pub fn log_summary(&self) -> String {
        match self {
            Event::CreateRequested { request } => format!(
                "CreateRequested {{ owner: {}, category: {} }}",
                request.owner.id, request.category.key
            ),
            Event::CloseRequested { actor, trigger, .. } => format!(
                "CloseRequested {{ actor: {}, staff: {}, trigger: {:?} }}",
                actor.user.id, actor.is_staff, trigger
            ),
            Event::AddMemberRequested { actor, user } => format!(
                "AddMemberRequested {{ actor: {}, staff: {}, user: {} }}",
                actor.user.id, actor.is_staff, user
            ),
            Event::MemberResolved { target, .. } => format!("MemberResolved {{ {:?} }}", target),
            Event::ChannelCreated { channel } => format!("ChannelCreated {{ channel: {} }}", channel),
            Event::WelcomePosted => "WelcomePosted".to_string(),
            Event::NoticePosted { notice } => format!("NoticePosted {{ {:?} }}", notice),
            Event::AccessGranted { user, .. } => format!("AccessGranted {{ user: {} }}", user),
            Event::PlatformFailed { operation, .. } => {
                format!("PlatformFailed {{ operation: {:?} }}", operation)
            }
            Event::DeletionCompleted => "DeletionCompleted".to_string(),
            Event::DeletionFailed { .. } => "DeletionFailed".to_string(),
        }
    }
}
