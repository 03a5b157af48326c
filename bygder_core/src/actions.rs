use std::{collections::HashMap, hash::Hash};

use crate::error::BygderError;

/// Lifecycle of one user action against one entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActionState {
    #[default]
    Idle,
    Pending,
    Done,
    /// Carries the message shown to the user.
    Failed(String),
}

impl ActionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionState::Pending)
    }
}

/// Per-entity action states, e.g. one like toggle per comment or one
/// promotion per member. At most one action per key is pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTracker<K: Eq + Hash> {
    states: HashMap<K, ActionState>,
}

impl<K: Eq + Hash> Default for ActionTracker<K> {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy> ActionTracker<K> {
    pub fn state(&self, key: K) -> ActionState {
        self.states.get(&key).cloned().unwrap_or_default()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.states.get(&key).is_some_and(ActionState::is_pending)
    }

    /// `Idle | Done | Failed -> Pending`. Rejects a second start while pending.
    pub fn begin(&mut self, key: K) -> Result<(), BygderError> {
        if self.is_pending(key) {
            return Err(BygderError::Busy);
        }
        self.states.insert(key, ActionState::Pending);
        Ok(())
    }

    /// `Pending -> Done | Failed`, returning the outcome unchanged.
    pub fn finish<T>(&mut self, key: K, outcome: Result<T, BygderError>) -> Result<T, BygderError> {
        let state = match &outcome {
            Ok(_) => ActionState::Done,
            Err(err) => ActionState::Failed(err.user_message()),
        };
        self.states.insert(key, state);
        outcome
    }

    /// Drops state for entities that no longer exist.
    pub fn forget(&mut self, key: K) {
        self.states.remove(&key);
    }

    pub fn pending(&self) -> impl Iterator<Item = K> + '_ {
        self.states
            .iter()
            .filter(|(_, state)| state.is_pending())
            .map(|(key, _)| *key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Denied;

    #[test]
    fn test_transitions() {
        let mut tracker = ActionTracker::default();
        assert_eq!(tracker.state(1u32), ActionState::Idle);

        tracker.begin(1).unwrap();
        assert!(tracker.is_pending(1));
        assert!(matches!(tracker.begin(1), Err(BygderError::Busy)));

        let value = tracker.finish(1, Ok(7)).unwrap();
        assert_eq!(value, 7);
        assert_eq!(tracker.state(1), ActionState::Done);

        tracker.begin(1).unwrap();
        let err = tracker
            .finish::<()>(1, Err(Denied::CannotModerate.into()))
            .unwrap_err();
        assert!(matches!(err, BygderError::Denied(Denied::CannotModerate)));
        assert!(matches!(tracker.state(1), ActionState::Failed(_)));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = ActionTracker::default();
        tracker.begin('a').unwrap();
        tracker.begin('b').unwrap();
        let _ = tracker.finish('b', Ok(()));
        assert!(tracker.is_pending('a'));
        assert_eq!(tracker.pending().collect::<Vec<_>>(), vec!['a']);

        tracker.forget('a');
        assert_eq!(tracker.state('a'), ActionState::Idle);
    }
}
