//! Pure state transition function.
//!
//! Each state has its own handler module with co-located tests:
//! - `absent`: no ticket yet, or not a ticket channel
//! - `provisioning`: channel creation in flight
//! - `open`: live ticket, including collaborator additions
//! - `closing`: countdown posted, deletion pending
//! - `deleted`: terminal

mod absent;
mod closing;
mod deleted;
mod open;
mod provisioning;

use super::effect::{Effect, LogLevel};
use super::event::Event;
use super::state::TicketState;

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub state: TicketState,
    /// Effects to execute.
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TicketState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    pub fn no_change(state: TicketState) -> Self {
        Self {
            state,
            effects: vec![],
        }
    }
}

/// Pure state transition function.
///
/// Given the current state and an event, returns the new state and effects to execute.
pub fn transition(state: TicketState, event: Event) -> TransitionResult {
    match &state {
        TicketState::Absent => absent::handle(state, event),
        TicketState::Provisioning { .. } => provisioning::handle(state, event),
        TicketState::Open(_) => open::handle(state, event),
        TicketState::Closing { .. } => closing::handle(state, event),
        TicketState::Deleted { .. } => deleted::handle(state, event),
    }
}

/// An event the current state does not expect. Logged and otherwise ignored.
fn ignore(state: TicketState, event: &Event) -> TransitionResult {
    let message = format!(
        "Ignoring {} in state {}",
        event.log_summary(),
        state.name()
    );
    TransitionResult::new(state, vec![Effect::log(LogLevel::Warn, message)])
}
