//! Explicit state machine for the ticket lifecycle.
//!
//! The design separates:
//! - **State**: what is known about one ticket (`TicketState`)
//! - **Events**: what happened (`Event`)
//! - **Effects**: what to do (`Effect`)
//! - **Transition**: pure function `(State, Event) -> (State, Vec<Effect>)`
//!
//! The server's interpreter executes effects against the chat platform and
//! feeds the events they produce back in.

pub mod effect;
pub mod event;
pub mod state;
pub mod transition;

pub use effect::*;
pub use event::*;
pub use state::*;
pub use transition::*;
