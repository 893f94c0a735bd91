//! Core state types.
//!
//! This module contains what a single state needs to know about its machine:
//! - The `State` trait with its lifecycle hooks
//! - The `Owner` back-reference filled in at build time
//! - Runtime errors and transition history

mod error;
mod history;
mod owner;
mod state;

pub(crate) use owner::Cursor;

pub use error::{FsmError, FsmResult};
pub use history::{StateHistory, StateTransition};
pub use owner::{Owner, OwnerCell};
pub use state::{State, StateKey};
