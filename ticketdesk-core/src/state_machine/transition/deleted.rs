//! Deleted (terminal) state transitions.

use super::{ignore, TransitionResult};
use crate::state_machine::event::Event;
use crate::state_machine::state::TicketState;

/// Nothing follows a deletion. A repeated completion report is expected when
/// a manual deletion races the scheduled one and is dropped silently.
pub fn handle(state: TicketState, event: Event) -> TransitionResult {
    match event {
        Event::DeletionCompleted => TransitionResult::no_change(state),
        event => ignore(state, &event),
    }
}
