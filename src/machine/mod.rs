//! The finite state machine runtime.
//!
//! All operations run synchronously on the caller's thread. A transition is
//! never partially observable: the outgoing state's `exit` completes, then
//! `previous`/`current` move, then the incoming state's `enter` runs.

mod fsm;

pub use fsm::FiniteStateMachine;
