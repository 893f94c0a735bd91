//! Runtime errors raised while driving a state machine.

use std::fmt::Debug;
use thiserror::Error;

/// Result type alias for state machine operations.
pub type FsmResult<T, K> = std::result::Result<T, FsmError<K>>;

/// Errors that can occur while a machine is running.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsmError<K: Debug> {
    /// A transition targeted a key that no registered state carries.
    #[error("Could not find a state with key {0:?}")]
    UnknownState(K),

    /// The state is not attached to a live machine, or asked for a
    /// transition while the machine was not running one of its hooks.
    #[error("This state does not belong to a running state machine")]
    Detached,
}
