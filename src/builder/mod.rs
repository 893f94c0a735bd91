//! Builder API for assembling state machines.
//!
//! [`FiniteStateMachineBuilder`] collects state instances and produces a
//! frozen [`FiniteStateMachine`](crate::machine::FiniteStateMachine).
//! [`state_keys!`](crate::state_keys) declares enum keys with the derives a
//! key needs.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::{BuildError, BuildResult};
pub use machine::FiniteStateMachineBuilder;
