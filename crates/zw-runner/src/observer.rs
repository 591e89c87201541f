//! Lifecycle hooks for hosts.
//!
//! Hooks are synchronous and fire-and-forget: the runner never waits on
//! them and ignores what they do.

use std::sync::{Arc, Mutex, PoisonError};

use zw_core::{Action, Check, Choice, FlagValue, Node};

use crate::error::ActionError;

/// Receives notifications about a dialogue session.
///
/// Every method has a no-op default, so implementors only override the
/// hooks they care about.
pub trait DialogueObserver: Send + Sync {
    /// A session started at `node_id`.
    fn dialogue_started(&self, _dialogue_id: &str, _node_id: &str) {}

    /// The session reached a terminal node.
    fn dialogue_ended(&self, _dialogue_id: &str, _node_id: &str) {}

    /// A node became current.
    fn node_entered(&self, _node_id: &str, _node: &Node) {}

    /// The current node is being left.
    fn node_exited(&self, _node_id: &str, _node: &Node) {}

    /// A choice was selected.
    fn choice_selected(&self, _index: usize, _choice: &Choice) {}

    /// An action finished. `result` is `None` for failed actions and for
    /// callbacks that returned nothing.
    fn action_executed(&self, _action: &Action, _result: Option<&FlagValue>) {}

    /// An action failed and the failure was absorbed.
    fn action_failed(&self, _action: &Action, _error: &ActionError) {}

    /// A leaf condition check was evaluated.
    fn condition_evaluated(&self, _check: &Check, _result: bool) {}
}

/// Broadcasts every hook to a list of observers, in registration order.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn DialogueObserver>>,
}

impl ObserverSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn push(&mut self, observer: Arc<dyn DialogueObserver>) {
        self.observers.push(observer);
    }

    /// Number of observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl DialogueObserver for ObserverSet {
    fn dialogue_started(&self, dialogue_id: &str, node_id: &str) {
        for o in &self.observers {
            o.dialogue_started(dialogue_id, node_id);
        }
    }

    fn dialogue_ended(&self, dialogue_id: &str, node_id: &str) {
        for o in &self.observers {
            o.dialogue_ended(dialogue_id, node_id);
        }
    }

    fn node_entered(&self, node_id: &str, node: &Node) {
        for o in &self.observers {
            o.node_entered(node_id, node);
        }
    }

    fn node_exited(&self, node_id: &str, node: &Node) {
        for o in &self.observers {
            o.node_exited(node_id, node);
        }
    }

    fn choice_selected(&self, index: usize, choice: &Choice) {
        for o in &self.observers {
            o.choice_selected(index, choice);
        }
    }

    fn action_executed(&self, action: &Action, result: Option<&FlagValue>) {
        for o in &self.observers {
            o.action_executed(action, result);
        }
    }

    fn action_failed(&self, action: &Action, error: &ActionError) {
        for o in &self.observers {
            o.action_failed(action, error);
        }
    }

    fn condition_evaluated(&self, check: &Check, result: bool) {
        for o in &self.observers {
            o.condition_evaluated(check, result);
        }
    }
}

/// A recorded lifecycle notification.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueEvent {
    /// See [`DialogueObserver::dialogue_started`].
    Started {
        /// Dialogue id.
        dialogue: String,
        /// Start node id.
        node: String,
    },
    /// See [`DialogueObserver::dialogue_ended`].
    Ended {
        /// Dialogue id.
        dialogue: String,
        /// Terminal node id.
        node: String,
    },
    /// See [`DialogueObserver::node_entered`].
    Entered(String),
    /// See [`DialogueObserver::node_exited`].
    Exited(String),
    /// See [`DialogueObserver::choice_selected`].
    ChoiceSelected(usize),
    /// See [`DialogueObserver::action_executed`].
    ActionExecuted {
        /// The action's wire type.
        kind: &'static str,
        /// The action's result.
        result: Option<FlagValue>,
    },
    /// See [`DialogueObserver::action_failed`].
    ActionFailed {
        /// The action's wire type.
        kind: &'static str,
        /// The error message.
        message: String,
    },
    /// See [`DialogueObserver::condition_evaluated`].
    ConditionEvaluated {
        /// The rendered check.
        check: String,
        /// Its outcome.
        result: bool,
    },
}

/// An observer that keeps every event in memory.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<DialogueEvent>>,
}

impl EventRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the events recorded so far.
    pub fn events(&self) -> Vec<DialogueEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return the events recorded so far.
    pub fn drain(&self) -> Vec<DialogueEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, event: DialogueEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl DialogueObserver for EventRecorder {
    fn dialogue_started(&self, dialogue_id: &str, node_id: &str) {
        self.record(DialogueEvent::Started {
            dialogue: dialogue_id.to_string(),
            node: node_id.to_string(),
        });
    }

    fn dialogue_ended(&self, dialogue_id: &str, node_id: &str) {
        self.record(DialogueEvent::Ended {
            dialogue: dialogue_id.to_string(),
            node: node_id.to_string(),
        });
    }

    fn node_entered(&self, node_id: &str, _node: &Node) {
        self.record(DialogueEvent::Entered(node_id.to_string()));
    }

    fn node_exited(&self, node_id: &str, _node: &Node) {
        self.record(DialogueEvent::Exited(node_id.to_string()));
    }

    fn choice_selected(&self, index: usize, _choice: &Choice) {
        self.record(DialogueEvent::ChoiceSelected(index));
    }

    fn action_executed(&self, action: &Action, result: Option<&FlagValue>) {
        self.record(DialogueEvent::ActionExecuted {
            kind: action.kind(),
            result: result.cloned(),
        });
    }

    fn action_failed(&self, action: &Action, error: &ActionError) {
        self.record(DialogueEvent::ActionFailed {
            kind: action.kind(),
            message: error.to_string(),
        });
    }

    fn condition_evaluated(&self, check: &Check, result: bool) {
        self.record(DialogueEvent::ConditionEvaluated {
            check: check.to_string(),
            result,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_broadcasts_in_order() {
        let first = Arc::new(EventRecorder::new());
        let second = Arc::new(EventRecorder::new());
        let mut set = ObserverSet::new();
        set.push(first.clone());
        set.push(second.clone());

        set.node_entered("a", &Node::new("A"));
        set.choice_selected(1, &Choice::new("go", "b"));

        let expected = vec![
            DialogueEvent::Entered("a".to_string()),
            DialogueEvent::ChoiceSelected(1),
        ];
        assert_eq!(first.events(), expected);
        assert_eq!(second.events(), expected);
    }

    #[test]
    fn drain_empties_the_recorder() {
        let recorder = EventRecorder::new();
        recorder.node_exited("a", &Node::new("A"));
        assert_eq!(recorder.drain().len(), 1);
        assert!(recorder.events().is_empty());
    }
}
