//! Build errors for the state machine builder.

use std::fmt::Debug;
use thiserror::Error;

/// Result type alias for builder operations.
pub type BuildResult<T, K> = std::result::Result<T, BuildError<K>>;

/// Errors that can occur while assembling a state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError<K: Debug> {
    #[error("A state with key {0:?} already exists")]
    DuplicateKey(K),

    #[error("A finite state machine is already built")]
    AlreadyBuilt,

    #[error("State {0:?} already belongs to a state machine")]
    AlreadyAttached(K),
}
