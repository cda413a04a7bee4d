use std::sync::Arc;

use bl_core::{
    Action, ActionOutcome, ChoiceDefinition, Condition, CurrentNode, DialogueError,
    ListenerErrorPolicy,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeEntered,
    NodeExited,
    ChoiceSelected,
    DialogueStarted,
    DialogueEnded,
    ActionExecuted,
    ConditionEvaluated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogueEvent {
    DialogueStarted {
        dialogue_id: String,
    },
    NodeEntered {
        node: CurrentNode,
    },
    NodeExited {
        node_id: String,
    },
    ChoiceSelected {
        node_id: String,
        choice_index: usize,
        choice: ChoiceDefinition,
    },
    DialogueEnded {
        dialogue_id: String,
        node_id: String,
    },
    ActionExecuted {
        node_id: String,
        action: Action,
        outcome: ActionOutcome,
    },
    ConditionEvaluated {
        node_id: String,
        choice_index: usize,
        condition: Condition,
        result: bool,
    },
}

impl DialogueEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DialogueStarted { .. } => EventKind::DialogueStarted,
            Self::NodeEntered { .. } => EventKind::NodeEntered,
            Self::NodeExited { .. } => EventKind::NodeExited,
            Self::ChoiceSelected { .. } => EventKind::ChoiceSelected,
            Self::DialogueEnded { .. } => EventKind::DialogueEnded,
            Self::ActionExecuted { .. } => EventKind::ActionExecuted,
            Self::ConditionEvaluated { .. } => EventKind::ConditionEvaluated,
        }
    }
}

pub type EventListener = Arc<dyn Fn(&DialogueEvent) -> Result<(), DialogueError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Single dispatch path for listeners registered at construction time and
/// through `DialogueRunner::on`. Listeners run in registration order.
pub struct EventDispatcher {
    listeners: Vec<(ListenerId, EventKind, EventListener)>,
    next_id: u64,
    policy: ListenerErrorPolicy,
}

impl EventDispatcher {
    pub fn new(policy: ListenerErrorPolicy) -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 1,
            policy,
        }
    }

    pub fn policy(&self) -> ListenerErrorPolicy {
        self.policy
    }

    pub fn on(&mut self, kind: EventKind, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, listener));
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(candidate, _, _)| *candidate != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .iter()
            .filter(|(_, candidate, _)| *candidate == kind)
            .count()
    }

    pub fn dispatch(&self, event: &DialogueEvent) -> Result<(), DialogueError> {
        let kind = event.kind();
        for (id, _, listener) in self
            .listeners
            .iter()
            .filter(|(_, candidate, _)| *candidate == kind)
        {
            if let Err(error) = listener(event) {
                match self.policy {
                    ListenerErrorPolicy::Isolate => {
                        warn!(listener = id.0, event = ?kind, error = %error, "event listener failed");
                    }
                    ListenerErrorPolicy::Abort => return Err(error),
                }
            }
        }
        Ok(())
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(ListenerErrorPolicy::default())
    }
}
