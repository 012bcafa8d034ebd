//! Provisioning state transitions.

use super::{ignore, TransitionResult};
use crate::messages::{Reply, Welcome};
use crate::state_machine::effect::{Effect, LogLevel};
use crate::state_machine::event::{Event, Operation};
use crate::state_machine::state::{TicketRecord, TicketState};
use crate::topic::TicketTopic;

/// Handle transitions from the Provisioning state.
pub fn handle(state: TicketState, event: Event) -> TransitionResult {
    let request = match state {
        TicketState::Provisioning { request } => request,
        other => return ignore(other, &event),
    };

    match event {
        Event::ChannelCreated { channel } => {
            let record = TicketRecord::new(
                channel,
                TicketTopic::new(&request.owner, &request.category),
                &request.category,
            );
            let welcome = Welcome::new(
                request.owner,
                request.mention_role,
                &request.category,
                request.subject,
            );
            TransitionResult::new(
                TicketState::Open(record.clone()),
                vec![
                    Effect::RememberTicket {
                        key: record.key,
                        channel,
                    },
                    Effect::PostWelcome { channel, welcome },
                ],
            )
        }

        Event::PlatformFailed {
            operation: Operation::CreateChannel,
            error,
        } => {
            let message = format!(
                "Failed to create ticket channel for {} in {}: {}",
                request.owner.id, request.category.key, error
            );
            TransitionResult::new(
                TicketState::Absent,
                vec![
                    Effect::log(LogLevel::Error, message),
                    Effect::Reply(Reply::CreateFailed),
                ],
            )
        }

        event => ignore(TicketState::Provisioning { request }, &event),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::state_machine::transition;

    fn provisioning() -> TicketState {
        TicketState::Provisioning {
            request: create_request(),
        }
    }

    #[test]
    fn test_channel_created_opens_ticket() {
        let result = transition(
            provisioning(),
            Event::ChannelCreated {
                channel: TICKET_CHANNEL,
            },
        );

        assert_eq!(result.state, TicketState::Open(record()));
        assert_eq!(result.effects.len(), 2);
        assert_eq!(
            result.effects[0],
            Effect::RememberTicket {
                key: create_request().key(),
                channel: TICKET_CHANNEL
            }
        );
        let Effect::PostWelcome { channel, welcome } = &result.effects[1] else {
            panic!("expected PostWelcome, got {:?}", result.effects[1]);
        };
        assert_eq!(*channel, TICKET_CHANNEL);
        assert_eq!(welcome.mention_role, STAFF_ROLE);
        assert_eq!(welcome.owner.id.0, OWNER);
    }

    #[test]
    fn test_create_failure_returns_to_absent() {
        let result = transition(
            provisioning(),
            Event::PlatformFailed {
                operation: Operation::CreateChannel,
                error: "Missing Permissions".to_string(),
            },
        );

        assert_eq!(result.state, TicketState::Absent);
        assert_eq!(replies(&result.effects), vec![Reply::CreateFailed]);
        assert!(matches!(
            &result.effects[0],
            Effect::Log { level: LogLevel::Error, message } if message.contains("Missing Permissions")
        ));
    }
}
