//! State transition history tracking.
//!
//! Machines built with [`with_history`](crate::builder::FiniteStateMachineBuilder::with_history)
//! record every completed transition here, optionally keeping only the most
//! recent entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single completed transition.
///
/// # Example
///
/// ```rust
/// use statewise::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: "idle",
///     to: "running",
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.from, "idle");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<K> {
    /// Key of the outgoing state
    pub from: K,
    /// Key of the incoming state
    pub to: K,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of state transitions.
///
/// An unbounded history keeps every transition. A bounded one evicts the
/// oldest entries once `capacity` is reached.
///
/// # Example
///
/// ```rust
/// use statewise::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::new();
/// history.record(StateTransition { from: 'a', to: 'b', timestamp: Utc::now() });
/// history.record(StateTransition { from: 'b', to: 'c', timestamp: Utc::now() });
///
/// assert_eq!(history.get_path(), vec![&'a', &'b', &'c']);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<K> {
    transitions: VecDeque<StateTransition<K>>,
    capacity: Option<usize>,
}

impl<K> Default for StateHistory<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> StateHistory<K> {
    /// Create a new, unbounded, empty history.
    pub fn new() -> Self {
        Self {
            transitions: VecDeque::new(),
            capacity: None,
        }
    }

    /// Create an empty history that keeps at most `capacity` transitions.
    ///
    /// A capacity of zero records nothing. Storage grows with the recorded
    /// transitions, not with `capacity`.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            capacity: Some(capacity),
        }
    }

    /// Maximum number of retained transitions, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Append a transition, evicting the oldest entries when full.
    pub fn record(&mut self, transition: StateTransition<K>) {
        if self.capacity == Some(0) {
            return;
        }
        if let Some(capacity) = self.capacity {
            while self.transitions.len() >= capacity {
                self.transitions.pop_front();
            }
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of keys traversed.
    ///
    /// The first entry is the `from` key of the oldest retained transition,
    /// followed by the `to` key of each transition in order.
    pub fn get_path(&self) -> Vec<&K> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and last retained transitions.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// All retained transitions, oldest first.
    pub fn transitions(&self) -> &VecDeque<StateTransition<K>> {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum Phase {
        Idle,
        Running,
        Done,
    }

    fn transition(from: Phase, to: Phase) -> StateTransition<Phase> {
        StateTransition {
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<Phase> = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.capacity(), None);
    }

    #[test]
    fn get_path_returns_key_sequence() {
        let mut history = StateHistory::new();
        history.record(transition(Phase::Idle, Phase::Running));
        history.record(transition(Phase::Running, Phase::Done));

        let path = history.get_path();
        assert_eq!(path, vec![&Phase::Idle, &Phase::Running, &Phase::Done]);
    }

    #[test]
    fn bounded_history_evicts_oldest() {
        let mut history = StateHistory::bounded(2);
        history.record(transition(Phase::Idle, Phase::Running));
        history.record(transition(Phase::Running, Phase::Done));
        history.record(transition(Phase::Done, Phase::Idle));

        assert_eq!(history.len(), 2);
        assert_eq!(history.transitions()[0].from, Phase::Running);
        assert_eq!(
            history.get_path(),
            vec![&Phase::Running, &Phase::Done, &Phase::Idle]
        );
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut history = StateHistory::bounded(usize::MAX);
        history.record(transition(Phase::Idle, Phase::Running));
        history.record(transition(Phase::Running, Phase::Done));

        assert_eq!(history.capacity(), Some(usize::MAX));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn bounded_history_keeps_evicting_at_capacity() {
        let mut history = StateHistory::bounded(1);
        for _ in 0..5 {
            history.record(transition(Phase::Idle, Phase::Running));
            history.record(transition(Phase::Running, Phase::Idle));
        }

        assert_eq!(history.len(), 1);
        assert_eq!(history.transitions()[0].to, Phase::Idle);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut history = StateHistory::bounded(0);
        history.record(transition(Phase::Idle, Phase::Running));
        assert!(history.is_empty());
    }

    #[test]
    fn duration_spans_first_to_last() {
        let start = Utc::now();
        let mut history = StateHistory::new();
        history.record(StateTransition {
            from: Phase::Idle,
            to: Phase::Running,
            timestamp: start,
        });
        history.record(StateTransition {
            from: Phase::Running,
            to: Phase::Done,
            timestamp: start + chrono::Duration::milliseconds(250),
        });

        assert_eq!(history.duration(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::bounded(4);
        history.record(transition(Phase::Idle, Phase::Running));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<Phase> = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.transitions(), history.transitions());
        assert_eq!(deserialized.capacity(), Some(4));
    }
}
