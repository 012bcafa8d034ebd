//! Closing state transitions.

use super::{ignore, TransitionResult};
use crate::messages::{Notice, Reply};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::{Event, Operation};
use crate::state_machine::state::TicketState;

/// Handle transitions from the Closing state.
///
/// Deletion runs outside the interaction that closed the ticket, so
/// `DeletionCompleted` / `DeletionFailed` arrive seconds later from the
/// scheduler rather than from the close itself.
pub fn handle(state: TicketState, event: Event) -> TransitionResult {
    let (ticket, trigger) = match state {
        TicketState::Closing { ticket, trigger } => (ticket, trigger),
        other => return ignore(other, &event),
    };
    let channel = ticket.channel;

    match event {
        // Countdown is visible; start the timer and release the requester.
        Event::NoticePosted {
            notice: Notice::ClosingCountdown { seconds },
        } => TransitionResult::new(
            TicketState::Closing {
                ticket: ticket.clone(),
                trigger,
            },
            vec![
                Effect::ScheduleDeletion {
                    ticket,
                    delay_secs: seconds,
                    trigger,
                },
                Effect::Reply(Reply::Closing),
            ],
        ),

        Event::PlatformFailed {
            operation: Operation::PostNotice,
            error,
        } => TransitionResult::new(
            TicketState::Open(ticket),
            vec![
                Effect::log(
                    LogLevel::Error,
                    format!("Failed to close ticket {}: {}", channel, error),
                ),
                Effect::Reply(Reply::CloseFailed),
            ],
        ),

        Event::DeletionCompleted => TransitionResult::new(
            TicketState::Deleted { channel },
            vec![
                Effect::ForgetTicket {
                    key: ticket.key,
                    channel,
                },
                Effect::log(LogLevel::Info, format!("Ticket channel {} deleted", channel)),
            ],
        ),

        // Nothing is rolled back; the channel stays around in Closing.
        Event::DeletionFailed { error } => TransitionResult::new(
            TicketState::Closing { ticket, trigger },
            vec![Effect::log(
                LogLevel::Error,
                format!("Failed to delete ticket channel {}: {}", channel, error),
            )],
        ),

        Event::CloseRequested { .. } | Event::AddMemberRequested { .. } => TransitionResult::new(
            TicketState::Closing { ticket, trigger },
            vec![Effect::Reply(Reply::AlreadyClosing)],
        ),

        // The channel still exists until the timer fires.
        Event::CreateRequested { .. } => {
            let reply = Reply::AlreadyOpen {
                label: ticket.label().to_string(),
                channel,
            };
            TransitionResult::new(
                TicketState::Closing { ticket, trigger },
                vec![Effect::Reply(reply)],
            )
        }

        event => ignore(TicketState::Closing { ticket, trigger }, &event),
    }
}
