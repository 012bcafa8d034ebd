//! Channel permission overwrites for ticket channels, in platform-neutral form.

use crate::ids::{RoleId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewChannel,
    SendMessages,
    AttachFiles,
    ReadMessageHistory,
    ManageChannels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteTarget {
    /// The guild's `@everyone` role.
    Everyone,
    Member(UserId),
    Role(RoleId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overwrite {
    pub target: OverwriteTarget,
    pub allow: Vec<Capability>,
    pub deny: Vec<Capability>,
}

/// Everyone is locked out; the owner and the category's staff role are let in.
pub fn ticket_overwrites(owner: UserId, staff_role: RoleId) -> Vec<Overwrite> {
    vec![
        Overwrite {
            target: OverwriteTarget::Everyone,
            allow: vec![],
            deny: vec![Capability::ViewChannel],
        },
        Overwrite {
            target: OverwriteTarget::Member(owner),
            allow: vec![
                Capability::ViewChannel,
                Capability::SendMessages,
                Capability::AttachFiles,
                Capability::ReadMessageHistory,
            ],
            deny: vec![],
        },
        Overwrite {
            target: OverwriteTarget::Role(staff_role),
            allow: vec![
                Capability::ViewChannel,
                Capability::SendMessages,
                Capability::ReadMessageHistory,
                Capability::ManageChannels,
            ],
            deny: vec![],
        },
    ]
}

/// What an added collaborator is granted.
pub fn collaborator_overwrite(user: UserId) -> Overwrite {
    Overwrite {
        target: OverwriteTarget::Member(user),
        allow: vec![
            Capability::ViewChannel,
            Capability::SendMessages,
            Capability::ReadMessageHistory,
            Capability::AttachFiles,
        ],
        deny: vec![],
    }
}
