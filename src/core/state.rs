//! Core State trait for state machine states.
//!
//! A state is one behavioral mode of a machine. It is identified by a key,
//! reacts to lifecycle hooks invoked by its machine, and may ask the machine
//! to switch to another state through its [`Owner`].

use super::error::FsmResult;
use super::owner::{Owner, OwnerCell};
use std::fmt::Debug;
use std::hash::Hash;

/// Identifier of a state within its machine.
///
/// Implemented for every `Clone + Eq + Hash + Debug + 'static` type, so enums,
/// strings and integers all work as keys.
pub trait StateKey: Clone + Eq + Hash + Debug + 'static {}

impl<T> StateKey for T where T: Clone + Eq + Hash + Debug + 'static {}

/// Trait for the behavior attached to a single state.
///
/// Only [`key`](State::key) and [`owner_cell`](State::owner_cell) are
/// required. The lifecycle hooks default to doing nothing.
///
/// # Hooks
///
/// - `enter` runs when the state becomes active.
/// - `exit` runs when the state stops being active.
/// - `update` runs once per caller-driven tick while the state is active,
///   with the time elapsed since the previous tick.
///
/// Any hook may call [`transition_to`](State::transition_to). The transition
/// runs as soon as the hook returns.
///
/// # Example
///
/// ```rust
/// use statewise::core::{FsmResult, OwnerCell, State};
///
/// #[derive(Default)]
/// struct Countdown {
///     remaining: f64,
///     owner: OwnerCell<&'static str>,
/// }
///
/// impl State<&'static str> for Countdown {
///     fn key(&self) -> &'static str {
///         "countdown"
///     }
///
///     fn owner_cell(&self) -> &OwnerCell<&'static str> {
///         &self.owner
///     }
///
///     fn enter(&mut self) -> FsmResult<(), &'static str> {
///         self.remaining = 3.0;
///         Ok(())
///     }
///
///     fn update(&mut self, elapsed: f64) -> FsmResult<(), &'static str> {
///         self.remaining -= elapsed;
///         if self.remaining <= 0.0 {
///             self.transition_to("countdown")?;
///         }
///         Ok(())
///     }
/// }
///
/// let state = Countdown::default();
/// assert_eq!(state.key(), "countdown");
/// assert!(state.owner().is_err());
/// ```
pub trait State<K: StateKey> {
    /// The key identifying this state. Must never change.
    fn key(&self) -> K;

    /// Slot holding this state's back-reference to its machine.
    fn owner_cell(&self) -> &OwnerCell<K>;

    /// Called by the machine when this state becomes active.
    fn enter(&mut self) -> FsmResult<(), K> {
        Ok(())
    }

    /// Called by the machine when this state stops being active.
    fn exit(&mut self) -> FsmResult<(), K> {
        Ok(())
    }

    /// Called by the machine on each tick while this state is active.
    ///
    /// `elapsed` is the non-negative time since the previous tick, in units
    /// chosen by the caller (conventionally seconds).
    fn update(&mut self, elapsed: f64) -> FsmResult<(), K> {
        let _ = elapsed;
        Ok(())
    }

    /// The machine this state belongs to.
    ///
    /// # Errors
    ///
    /// [`FsmError::Detached`](super::FsmError::Detached) if the state has not
    /// been attached to a machine yet.
    fn owner(&self) -> FsmResult<&Owner<K>, K> {
        self.owner_cell().get()
    }

    /// Ask the owning machine to transition to `key`.
    ///
    /// # Errors
    ///
    /// Fails when the state is not attached, when called outside one of the
    /// state's hooks, or when the machine has no state registered under
    /// `key`.
    fn transition_to(&self, key: K) -> FsmResult<(), K> {
        self.owner()?.transition_to(key)
    }
}
