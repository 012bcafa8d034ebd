//! Authorization predicates.
//!
//! All of these answer with a `bool`; turning a `false` into a rejection
//! reply is the caller's job.

use crate::ids::{RoleId, UserRef};
use crate::topic::TicketTopic;

/// What the platform tells us about the acting member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberStanding {
    pub roles: Vec<RoleId>,
    /// Holds the manage-channels permission in the invoking channel.
    pub manage_channels: bool,
}

/// True iff the member holds one of `staff_roles` or can manage channels.
///
/// Callers always include the global staff role; the category's own staff
/// role is added when the category is known.
pub fn has_staff_capability(standing: &MemberStanding, staff_roles: &[RoleId]) -> bool {
    standing.manage_channels || standing.roles.iter().any(|r| staff_roles.contains(r))
}

/// The user behind a request, with their staff standing already evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: UserRef,
    pub is_staff: bool,
}

pub fn can_close(topic: &TicketTopic, actor: &Actor) -> bool {
    topic.belongs_to(actor.user.id) || actor.is_staff
}

/// Owners cannot add collaborators to their own tickets.
pub fn can_add_collaborator(actor: &Actor) -> bool {
    actor.is_staff
}
