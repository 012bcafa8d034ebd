//! Absent state transitions.

use super::{ignore, TransitionResult};
use crate::access::ticket_overwrites;
use crate::messages::Reply;
use crate::naming::channel_name;
use crate::state_machine::effect::{ChannelRequest, Effect};
use crate::state_machine::event::{CloseTrigger, Event};
use crate::state_machine::state::TicketState;
use crate::topic::TicketTopic;

/// Handle transitions from the Absent state.
///
/// Absent covers both "no ticket for this key yet" and "the invoking channel
/// is not a ticket channel".
pub fn handle(state: TicketState, event: Event) -> TransitionResult {
    match event {
        Event::CreateRequested { request } => {
            let channel_request = ChannelRequest {
                name: channel_name(&request.owner, &request.category),
                topic: TicketTopic::new(&request.owner, &request.category).encode(),
                parent: request.parent,
                overwrites: ticket_overwrites(request.owner.id, request.category.staff_role),
            };
            TransitionResult::new(
                TicketState::Provisioning { request },
                vec![Effect::CreateChannel {
                    request: channel_request,
                }],
            )
        }

        Event::CloseRequested { trigger, .. } => {
            let reply = match trigger {
                CloseTrigger::Command => Reply::NotATicket,
                CloseTrigger::Button => Reply::NotATicketChannel,
            };
            TransitionResult::new(state, vec![Effect::Reply(reply)])
        }

        Event::AddMemberRequested { .. } => {
            TransitionResult::new(state, vec![Effect::Reply(Reply::NotATicket)])
        }

        event => ignore(state, &event),
    }
}
