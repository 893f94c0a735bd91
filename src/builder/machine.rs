//! Builder for assembling state machines from state instances.

use crate::builder::error::{BuildError, BuildResult};
use crate::core::{OwnerCell, State, StateHistory, StateKey};
use crate::machine::FiniteStateMachine;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Single-use builder for [`FiniteStateMachine`].
///
/// A builder always starts from its initial state; there is no empty
/// constructor. Each further state must carry a key distinct from every state
/// already added. [`build`](Self::build) hands the collected states to the new
/// machine, after which the builder rejects further use.
///
/// # Example
///
/// ```rust
/// use statewise::builder::FiniteStateMachineBuilder;
/// use statewise::core::{OwnerCell, State};
///
/// #[derive(Default)]
/// struct On(OwnerCell<bool>);
///
/// #[derive(Default)]
/// struct Off(OwnerCell<bool>);
///
/// impl State<bool> for On {
///     fn key(&self) -> bool { true }
///     fn owner_cell(&self) -> &OwnerCell<bool> { &self.0 }
/// }
///
/// impl State<bool> for Off {
///     fn key(&self) -> bool { false }
///     fn owner_cell(&self) -> &OwnerCell<bool> { &self.0 }
/// }
///
/// let mut builder = FiniteStateMachineBuilder::with_initial_state_of::<Off>();
/// builder.with_state_of::<On>()?;
/// let mut fsm = builder.build()?;
///
/// fsm.enter_state()?;
/// fsm.transition_to(true)?;
/// assert_eq!(fsm.current(), true);
/// assert_eq!(fsm.previous(), Some(false));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FiniteStateMachineBuilder<K: StateKey> {
    states: HashMap<K, Box<dyn State<K>>>,
    initial: K,
    history: Option<StateHistory<K>>,
    built: bool,
}

impl<K: StateKey> FiniteStateMachineBuilder<K> {
    /// Start a builder with `state` as the initial state.
    pub fn with_initial_state<S>(state: S) -> Self
    where
        S: State<K> + 'static,
    {
        let initial = state.key();
        let mut states: HashMap<K, Box<dyn State<K>>> = HashMap::new();
        states.insert(initial.clone(), Box::new(state));
        Self {
            states,
            initial,
            history: None,
            built: false,
        }
    }

    /// Start a builder whose initial state is `S::default()`.
    pub fn with_initial_state_of<S>() -> Self
    where
        S: State<K> + Default + 'static,
    {
        Self::with_initial_state(S::default())
    }

    /// Add another state.
    ///
    /// # Errors
    ///
    /// - [`BuildError::DuplicateKey`] if a state with the same key was already
    ///   added, the initial state included. The builder is left as it was.
    /// - [`BuildError::AlreadyBuilt`] if [`build`](Self::build) already ran.
    pub fn with_state<S>(&mut self, state: S) -> BuildResult<&mut Self, K>
    where
        S: State<K> + 'static,
    {
        if self.built {
            return Err(BuildError::AlreadyBuilt);
        }
        match self.states.entry(state.key()) {
            Entry::Occupied(entry) => Err(BuildError::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(Box::new(state));
                Ok(self)
            }
        }
    }

    /// Add `S::default()` as another state.
    ///
    /// Fails under the same conditions as [`with_state`](Self::with_state).
    pub fn with_state_of<S>(&mut self) -> BuildResult<&mut Self, K>
    where
        S: State<K> + Default + 'static,
    {
        self.with_state(S::default())
    }

    /// Record the most recent `capacity` transitions on the built machine.
    pub fn with_history(&mut self, capacity: usize) -> &mut Self {
        self.history = Some(StateHistory::bounded(capacity));
        self
    }

    /// Record every transition on the built machine.
    pub fn with_full_history(&mut self) -> &mut Self {
        self.history = Some(StateHistory::new());
        self
    }

    /// Number of states collected so far.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Whether a state with `key` has been added.
    pub fn contains(&self, key: &K) -> bool {
        self.states.contains_key(key)
    }

    /// Build the machine and attach every collected state to it.
    ///
    /// The machine starts in the initial state but does not enter it.
    ///
    /// # Errors
    ///
    /// - [`BuildError::AlreadyBuilt`] when called a second time, since the
    ///   states have moved into the first machine.
    /// - [`BuildError::AlreadyAttached`] if a state already belongs to a
    ///   machine or shares its [`OwnerCell`] with another state. The builder
    ///   keeps its states in that case.
    pub fn build(&mut self) -> BuildResult<FiniteStateMachine<K>, K> {
        if self.built || self.states.is_empty() {
            return Err(BuildError::AlreadyBuilt);
        }
        self.check_attachable()?;
        self.built = true;

        let states = std::mem::take(&mut self.states);
        debug!(
            states = states.len(),
            initial = ?self.initial,
            "building finite state machine"
        );

        FiniteStateMachine::new(states, self.initial.clone(), self.history.take())
    }

    fn check_attachable(&self) -> BuildResult<(), K> {
        let mut cells: HashSet<*const OwnerCell<K>> = HashSet::new();
        for (key, state) in &self.states {
            let cell = state.owner_cell();
            if cell.is_attached() || !cells.insert(cell as *const OwnerCell<K>) {
                return Err(BuildError::AlreadyAttached(key.clone()));
            }
        }
        Ok(())
    }
}

impl<K: StateKey> fmt::Debug for FiniteStateMachineBuilder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteStateMachineBuilder")
            .field("initial", &self.initial)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("built", &self.built)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OwnerCell;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Door {
        Open,
        Closed,
        Locked,
    }

    struct Plain {
        key: Door,
        owner: OwnerCell<Door>,
    }

    impl Plain {
        fn new(key: Door) -> Self {
            Self {
                key,
                owner: OwnerCell::new(),
            }
        }
    }

    impl State<Door> for Plain {
        fn key(&self) -> Door {
            self.key
        }

        fn owner_cell(&self) -> &OwnerCell<Door> {
            &self.owner
        }
    }

    #[derive(Default)]
    struct Locked {
        owner: OwnerCell<Door>,
    }

    impl State<Door> for Locked {
        fn key(&self) -> Door {
            Door::Locked
        }

        fn owner_cell(&self) -> &OwnerCell<Door> {
            &self.owner
        }
    }

    /// Refers to an owner cell it does not own.
    struct Borrowed {
        key: Door,
        owner: &'static OwnerCell<Door>,
    }

    impl State<Door> for Borrowed {
        fn key(&self) -> Door {
            self.key
        }

        fn owner_cell(&self) -> &OwnerCell<Door> {
            self.owner
        }
    }

    fn leaked_cell() -> &'static OwnerCell<Door> {
        Box::leak(Box::new(OwnerCell::new()))
    }

    #[test]
    fn builder_starts_with_initial_state() {
        let builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        assert_eq!(builder.len(), 1);
        assert!(!builder.is_empty());
        assert!(builder.contains(&Door::Closed));
    }

    #[test]
    fn fluent_api_builds_machine() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        builder
            .with_state(Plain::new(Door::Open))
            .unwrap()
            .with_state_of::<Locked>()
            .unwrap();

        let fsm = builder.build().unwrap();
        assert_eq!(fsm.current(), Door::Closed);
        assert_eq!(fsm.previous(), None);
        assert_eq!(fsm.len(), 3);
        assert!(fsm.contains(&Door::Locked));
    }

    #[test]
    fn factory_initial_state() {
        let fsm = FiniteStateMachineBuilder::with_initial_state_of::<Locked>()
            .build()
            .unwrap();
        assert_eq!(fsm.current(), Door::Locked);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        builder.with_state(Plain::new(Door::Open)).unwrap();

        let result = builder.with_state(Plain::new(Door::Open));
        assert!(matches!(result, Err(BuildError::DuplicateKey(Door::Open))));
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn duplicate_of_initial_state_is_rejected() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state_of::<Locked>();

        let result = builder.with_state(Plain::new(Door::Locked));
        assert!(matches!(result, Err(BuildError::DuplicateKey(Door::Locked))));

        // The first Locked state survives and the builder is still usable.
        let fsm = builder.build().unwrap();
        assert_eq!(fsm.len(), 1);
    }

    #[test]
    fn build_attaches_every_state() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        builder.with_state(Plain::new(Door::Open)).unwrap();
        let mut fsm = builder.build().unwrap();

        // Only an attached state can reach the machine; transition_to on the
        // machine proves both states are registered.
        fsm.transition_to(Door::Open).unwrap();
        fsm.transition_to(Door::Closed).unwrap();
        assert_eq!(fsm.previous(), Some(Door::Open));
    }

    #[test]
    fn second_build_fails() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        assert!(builder.build().is_ok());

        assert!(builder.is_empty());
        assert!(matches!(builder.build(), Err(BuildError::AlreadyBuilt)));
    }

    #[test]
    fn with_state_after_build_fails() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        builder.build().unwrap();

        let result = builder.with_state(Plain::new(Door::Open));
        assert!(matches!(result, Err(BuildError::AlreadyBuilt)));
        assert!(matches!(builder.build(), Err(BuildError::AlreadyBuilt)));
    }

    #[test]
    fn shared_owner_cell_fails_without_consuming_builder() {
        let cell = leaked_cell();
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Borrowed {
            key: Door::Closed,
            owner: cell,
        });
        builder
            .with_state(Borrowed {
                key: Door::Open,
                owner: cell,
            })
            .unwrap();

        assert!(matches!(builder.build(), Err(BuildError::AlreadyAttached(_))));
        assert_eq!(builder.len(), 2);
        assert!(!cell.is_attached());

        // Retrying reports the same cause, not a spent builder.
        assert!(matches!(builder.build(), Err(BuildError::AlreadyAttached(_))));
        assert!(builder.with_state_of::<Locked>().is_ok());
    }

    #[test]
    fn state_attached_to_another_machine_is_rejected() {
        let cell = leaked_cell();
        FiniteStateMachineBuilder::with_initial_state(Borrowed {
            key: Door::Closed,
            owner: cell,
        })
        .build()
        .unwrap();

        let mut builder = FiniteStateMachineBuilder::with_initial_state(Borrowed {
            key: Door::Open,
            owner: cell,
        });
        assert_eq!(
            builder.build().unwrap_err(),
            BuildError::AlreadyAttached(Door::Open)
        );
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn history_option_is_carried_over() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        let fsm = builder.with_history(3).build().unwrap();
        assert_eq!(fsm.history().unwrap().capacity(), Some(3));

        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        let fsm = builder.with_full_history().build().unwrap();
        assert_eq!(fsm.history().unwrap().capacity(), None);
    }

    #[test]
    fn unbounded_capacity_builds() {
        let mut builder = FiniteStateMachineBuilder::with_initial_state(Plain::new(Door::Closed));
        builder.with_state(Plain::new(Door::Open)).unwrap();
        let mut fsm = builder.with_history(usize::MAX).build().unwrap();

        fsm.transition_to(Door::Open).unwrap();
        assert_eq!(fsm.history().unwrap().len(), 1);
    }
}
