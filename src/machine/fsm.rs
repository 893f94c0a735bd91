//! The runtime context that owns states and moves between them.

use crate::builder::{BuildError, BuildResult};
use crate::core::{
    Cursor, FsmError, FsmResult, Owner, State, StateHistory, StateKey, StateTransition,
};
use chrono::Utc;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

type BoxedState<K> = Box<dyn State<K>>;

/// A finite state machine over a fixed set of states.
///
/// Built by [`FiniteStateMachineBuilder`](crate::builder::FiniteStateMachineBuilder).
/// The set of states is frozen at build time; the machine only changes which
/// one is current.
///
/// The machine does not enter its initial state on construction. Call
/// [`enter_state`](Self::enter_state) once before the first
/// [`update_state`](Self::update_state), and [`exit_state`](Self::exit_state)
/// when done.
///
/// Not `Send`: drive a machine from a single thread.
pub struct FiniteStateMachine<K: StateKey> {
    states: HashMap<K, BoxedState<K>>,
    cursor: Rc<RefCell<Cursor<K>>>,
    history: Option<StateHistory<K>>,
}

impl<K: StateKey> FiniteStateMachine<K> {
    /// Freeze `states` into a machine whose current state is `initial`, and
    /// attach every state to it.
    pub(crate) fn new(
        states: HashMap<K, BoxedState<K>>,
        initial: K,
        history: Option<StateHistory<K>>,
    ) -> BuildResult<Self, K> {
        if states.is_empty() {
            return Err(BuildError::AlreadyBuilt);
        }

        let keys = states.keys().cloned().collect();
        let cursor = Rc::new(RefCell::new(Cursor::new(keys, initial)));

        for (key, state) in &states {
            if state.owner_cell().attach(Owner::new(&cursor)).is_err() {
                return Err(BuildError::AlreadyAttached(key.clone()));
            }
        }

        Ok(Self {
            states,
            cursor,
            history,
        })
    }

    /// Key of the active state.
    pub fn current(&self) -> K {
        self.cursor.borrow().current.clone()
    }

    /// Key of the state active before the most recent transition.
    ///
    /// `None` until the first transition has completed.
    pub fn previous(&self) -> Option<K> {
        self.cursor.borrow().previous.clone()
    }

    /// Whether a state is registered under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.states.contains_key(key)
    }

    /// Keys of all registered states, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.states.keys()
    }

    /// Number of registered states. Never zero.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always `false`; a machine holds at least its initial state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Transition history, if enabled on the builder.
    pub fn history(&self) -> Option<&StateHistory<K>> {
        self.history.as_ref()
    }

    /// Invoke `enter` on the current state.
    pub fn enter_state(&mut self) -> FsmResult<(), K> {
        self.run_hook(|state| state.enter())
    }

    /// Invoke `exit` on the current state.
    pub fn exit_state(&mut self) -> FsmResult<(), K> {
        self.run_hook(|state| state.exit())
    }

    /// Invoke `update` on the current state, typically once per tick.
    ///
    /// Transitions requested by the state run before this returns.
    pub fn update_state(&mut self, elapsed: f64) -> FsmResult<(), K> {
        trace!(key = ?self.cursor.borrow().current, elapsed, "updating state");
        self.run_hook(|state| state.update(elapsed))
    }

    /// Transition to the state registered under `key`.
    ///
    /// Exits the current state, records it as `previous`, makes `key` current
    /// and enters it. Transitioning to the current key runs the full
    /// exit/enter sequence as well.
    ///
    /// # Errors
    ///
    /// [`FsmError::UnknownState`] if `key` is not registered. The machine is
    /// left untouched in that case. Errors returned by the `exit` or `enter`
    /// hooks are propagated as-is.
    pub fn transition_to(&mut self, key: K) -> FsmResult<(), K> {
        match self.perform(key) {
            Ok(()) => self.drain_pending(),
            Err(err) => self.abandon(err),
        }
    }

    /// Call `hook` on the current state with owner requests enabled.
    fn call_hook<F>(&mut self, hook: F) -> FsmResult<(), K>
    where
        F: FnOnce(&mut (dyn State<K> + 'static)) -> FsmResult<(), K>,
    {
        let current = self.cursor.borrow().current.clone();
        let Some(state) = self.states.get_mut(&current) else {
            return Err(FsmError::UnknownState(current));
        };

        let was_in_hook = std::mem::replace(&mut self.cursor.borrow_mut().in_hook, true);
        let result = hook(state.as_mut());
        self.cursor.borrow_mut().in_hook = was_in_hook;
        result
    }

    /// Run a hook on the current state, then any transitions it requested.
    fn run_hook<F>(&mut self, hook: F) -> FsmResult<(), K>
    where
        F: FnOnce(&mut (dyn State<K> + 'static)) -> FsmResult<(), K>,
    {
        match self.call_hook(hook) {
            Ok(()) => self.drain_pending(),
            Err(err) => self.abandon(err),
        }
    }

    fn drain_pending(&mut self) -> FsmResult<(), K> {
        loop {
            let next = self.cursor.borrow_mut().pending.pop_front();
            let Some(key) = next else {
                return Ok(());
            };
            if let Err(err) = self.perform(key) {
                return self.abandon(err);
            }
        }
    }

    /// Drop queued requests and surface `err`.
    fn abandon(&mut self, err: FsmError<K>) -> FsmResult<(), K> {
        self.cursor.borrow_mut().pending.clear();
        Err(err)
    }

    fn perform(&mut self, key: K) -> FsmResult<(), K> {
        if !self.states.contains_key(&key) {
            warn!(key = ?key, "could not find a state with the specified key");
            return Err(FsmError::UnknownState(key));
        }

        self.call_hook(|state| state.exit())?;

        let from = self.cursor.borrow_mut().shift(key.clone());
        debug!(from = ?from, to = ?key, "state transition");
        if let Some(history) = self.history.as_mut() {
            history.record(StateTransition {
                from,
                to: key,
                timestamp: Utc::now(),
            });
        }

        self.call_hook(|state| state.enter())
    }
}

impl<K: StateKey> fmt::Debug for FiniteStateMachine<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cursor = self.cursor.borrow();
        f.debug_struct("FiniteStateMachine")
            .field("current", &cursor.current)
            .field("previous", &cursor.previous)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .finish()
    }
}
