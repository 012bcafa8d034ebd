//! Open state transitions.
//!
//! Besides closing, an open ticket takes collaborator additions. Those mutate
//! the channel's access in place and never leave the Open state.

use super::{ignore, TransitionResult};
use crate::access::collaborator_overwrite;
use crate::messages::{Notice, Reply};
use crate::policy::{can_add_collaborator, can_close};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::{AddTarget, Event, Operation};
use crate::state_machine::state::TicketState;

/// Handle transitions from the Open state.
pub fn handle(state: TicketState, event: Event) -> TransitionResult {
    let ticket = match state {
        TicketState::Open(ticket) => ticket,
        other => return ignore(other, &event),
    };
    let channel = ticket.channel;

    match event {
        Event::WelcomePosted => {
            let reply = Reply::TicketCreated {
                label: ticket.label().to_string(),
                channel,
            };
            TransitionResult::new(TicketState::Open(ticket), vec![Effect::Reply(reply)])
        }

        // The channel exists but is unusable; it is left for staff to clean up.
        Event::PlatformFailed {
            operation: Operation::PostWelcome,
            error,
        } => TransitionResult::new(
            TicketState::Open(ticket),
            vec![
                Effect::log(
                    LogLevel::Error,
                    format!("Failed to post welcome in {}: {}", channel, error),
                ),
                Effect::Reply(Reply::CreateFailed),
            ],
        ),

        Event::CreateRequested { .. } => {
            let reply = Reply::AlreadyOpen {
                label: ticket.label().to_string(),
                channel,
            };
            TransitionResult::new(TicketState::Open(ticket), vec![Effect::Reply(reply)])
        }

        Event::CloseRequested {
            actor,
            trigger,
            delay_secs,
        } => {
            if !can_close(&ticket.topic, &actor) {
                return TransitionResult::new(
                    TicketState::Open(ticket),
                    vec![Effect::Reply(Reply::CloseDenied)],
                );
            }
            TransitionResult::new(
                TicketState::Closing { ticket, trigger },
                vec![
                    Effect::Defer,
                    Effect::PostNotice {
                        channel,
                        notice: Notice::ClosingCountdown {
                            seconds: delay_secs,
                        },
                    },
                ],
            )
        }

        Event::AddMemberRequested { actor, user } => {
            let effect = if can_add_collaborator(&actor) {
                Effect::ResolveMember {
                    channel,
                    user,
                    by: actor.user.id,
                }
            } else {
                Effect::Reply(Reply::AddDenied)
            };
            TransitionResult::new(TicketState::Open(ticket), vec![effect])
        }

        Event::MemberResolved { target, by } => {
            let effect = match target {
                AddTarget::NotAMember => Effect::Reply(Reply::MemberNotFound),
                AddTarget::Member { can_view: true, .. } => Effect::Reply(Reply::AlreadyHasAccess),
                AddTarget::Member {
                    user,
                    can_view: false,
                } => Effect::GrantAccess {
                    channel,
                    overwrite: collaborator_overwrite(user),
                    user,
                    by,
                },
            };
            TransitionResult::new(TicketState::Open(ticket), vec![effect])
        }

        Event::AccessGranted { user, by } => TransitionResult::new(
            TicketState::Open(ticket),
            vec![
                Effect::Reply(Reply::MemberAdded { user }),
                Effect::PostNotice {
                    channel,
                    notice: Notice::MemberAdded { user, by },
                },
            ],
        ),

        Event::PlatformFailed {
            operation: Operation::ResolveMember | Operation::GrantAccess,
            error,
        } => TransitionResult::new(
            TicketState::Open(ticket),
            vec![
                Effect::log(
                    LogLevel::Error,
                    format!("Failed to add member to {}: {}", channel, error),
                ),
                Effect::Reply(Reply::AddFailed),
            ],
        ),

        // The in-channel announcement after an addition.
        Event::NoticePosted {
            notice: Notice::MemberAdded { .. },
        } => TransitionResult::no_change(TicketState::Open(ticket)),

        Event::PlatformFailed {
            operation: Operation::PostNotice,
            error,
        } => TransitionResult::new(
            TicketState::Open(ticket),
            vec![Effect::log(
                LogLevel::Warn,
                format!("Failed to announce new member in {}: {}", channel, error),
            )],
        ),

        event => ignore(TicketState::Open(ticket), &event),
    }
}
