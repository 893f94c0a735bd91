//! Back-reference from a state to the machine that owns it.
//!
//! A machine exclusively owns its states, so a state cannot hold a reference
//! to the machine itself. Instead every machine keeps its bookkeeping (the
//! frozen key set, `current`, `previous` and queued transition requests) in a
//! [`Cursor`], and each attached state receives a weak [`Owner`] handle onto
//! that cursor. Once the machine is dropped every handle reports detached.

use super::error::{FsmError, FsmResult};
use super::state::StateKey;
use std::cell::{OnceCell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::warn;

/// Machine bookkeeping shared between the machine and its owner handles.
pub(crate) struct Cursor<K: StateKey> {
    pub(crate) keys: HashSet<K>,
    pub(crate) current: K,
    pub(crate) previous: Option<K>,
    pub(crate) pending: VecDeque<K>,
    /// Set while the machine is running one of a state's hooks.
    pub(crate) in_hook: bool,
}

impl<K: StateKey> Cursor<K> {
    pub(crate) fn new(keys: HashSet<K>, initial: K) -> Self {
        Self {
            keys,
            current: initial,
            previous: None,
            pending: VecDeque::new(),
            in_hook: false,
        }
    }

    /// Move `current` into `previous` and make `key` current.
    pub(crate) fn shift(&mut self, key: K) -> K {
        let outgoing = std::mem::replace(&mut self.current, key);
        self.previous = Some(outgoing.clone());
        outgoing
    }
}

/// Handle to the machine a state is attached to.
///
/// Obtained through [`State::owner`](crate::core::State::owner). Lets state
/// logic read `current`/`previous` and request transitions. The handle does
/// not keep the machine alive.
pub struct Owner<K: StateKey> {
    cursor: Weak<RefCell<Cursor<K>>>,
}

impl<K: StateKey> Owner<K> {
    pub(crate) fn new(cursor: &Rc<RefCell<Cursor<K>>>) -> Self {
        Self {
            cursor: Rc::downgrade(cursor),
        }
    }

    fn cursor(&self) -> FsmResult<Rc<RefCell<Cursor<K>>>, K> {
        self.cursor.upgrade().ok_or(FsmError::Detached)
    }

    /// Key of the active state.
    ///
    /// # Errors
    ///
    /// [`FsmError::Detached`] if the machine has been dropped.
    pub fn current(&self) -> FsmResult<K, K> {
        Ok(self.cursor()?.borrow().current.clone())
    }

    /// Key of the state active before the most recent transition.
    ///
    /// `None` until the first transition has completed.
    ///
    /// # Errors
    ///
    /// [`FsmError::Detached`] if the machine has been dropped.
    pub fn previous(&self) -> FsmResult<Option<K>, K> {
        Ok(self.cursor()?.borrow().previous.clone())
    }

    /// Whether the machine has a state registered under `key`.
    ///
    /// Always `false` once the machine has been dropped.
    pub fn contains(&self, key: &K) -> bool {
        self.cursor()
            .map(|cursor| cursor.borrow().keys.contains(key))
            .unwrap_or(false)
    }

    /// Request a transition to `key`.
    ///
    /// Only valid from inside one of the state's `enter`, `exit` or `update`
    /// hooks. The key is validated immediately. The transition itself runs as
    /// soon as the hook that requested it returns; requests made from one
    /// hook run in the order they were made.
    ///
    /// # Errors
    ///
    /// - [`FsmError::Detached`] if the machine has been dropped or is not
    ///   running a hook.
    /// - [`FsmError::UnknownState`] if no state is registered under `key`.
    ///
    /// Nothing is queued on error.
    pub fn transition_to(&self, key: K) -> FsmResult<(), K> {
        let cursor = self.cursor()?;
        let mut cursor = cursor.borrow_mut();
        if !cursor.in_hook {
            warn!(key = ?key, "transition requested outside of a state hook");
            return Err(FsmError::Detached);
        }
        if !cursor.keys.contains(&key) {
            warn!(key = ?key, "transition requested to an unregistered state");
            return Err(FsmError::UnknownState(key));
        }
        cursor.pending.push_back(key);
        Ok(())
    }
}

impl<K: StateKey> Clone for Owner<K> {
    fn clone(&self) -> Self {
        Self {
            cursor: Weak::clone(&self.cursor),
        }
    }
}

impl<K: StateKey> fmt::Debug for Owner<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cursor.upgrade() {
            Some(cursor) => {
                let cursor = cursor.borrow();
                f.debug_struct("Owner")
                    .field("current", &cursor.current)
                    .field("previous", &cursor.previous)
                    .finish()
            }
            None => f.write_str("Owner(detached)"),
        }
    }
}

/// Set-once slot holding a state's [`Owner`].
///
/// Concrete states embed one and hand it out from
/// [`State::owner_cell`](crate::core::State::owner_cell). The builder fills it
/// exactly once when the machine is assembled.
pub struct OwnerCell<K: StateKey> {
    inner: OnceCell<Owner<K>>,
}

impl<K: StateKey> OwnerCell<K> {
    /// Create an empty, unattached slot.
    pub fn new() -> Self {
        Self {
            inner: OnceCell::new(),
        }
    }

    /// Whether a machine has attached itself to this slot.
    pub fn is_attached(&self) -> bool {
        self.inner.get().is_some()
    }

    /// The attached owner.
    ///
    /// # Errors
    ///
    /// [`FsmError::Detached`] if no machine has been attached yet.
    pub fn get(&self) -> FsmResult<&Owner<K>, K> {
        self.inner.get().ok_or(FsmError::Detached)
    }

    /// Returns the owner back if the slot was already filled.
    pub(crate) fn attach(&self, owner: Owner<K>) -> Result<(), Owner<K>> {
        self.inner.set(owner)
    }
}

impl<K: StateKey> Default for OwnerCell<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StateKey> fmt::Debug for OwnerCell<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerCell")
            .field("attached", &self.is_attached())
            .finish()
    }
}
