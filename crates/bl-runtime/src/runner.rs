use std::collections::BTreeMap;
use std::sync::Arc;

use bl_core::{
    is_reserved_key, ChoiceDefinition, ChoiceView, CurrentNode, DialogueDefinition, DialogueError,
    DialogueView, FlagMap, FlagScopes, FlagStore, HistoryEntry, ListenerErrorPolicy,
    MemoryFlagStore, NodeDefinition, RunnerConfig, SerializedState, Speaker, UnavailableReason,
    DEFAULT_MAX_AUTO_ADVANCE,
};
use tracing::{debug, warn};

use crate::actions::{execute_actions, ActionHandler, ActionScope};
use crate::condition::evaluate;
use crate::events::{DialogueEvent, EventDispatcher, EventKind, EventListener, ListenerId};
use crate::interpolate::{
    interpolate, I18nAdapter, InterpolationContext, InterpolationFunction, SPEAKER_TOKEN,
};

mod choices;
mod entry;
mod lifecycle;
mod navigation;
mod snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartOptions {
    pub preserve_conversation_flags: bool,
}

/// Filters for [`DialogueRunner::get_choices`]. The default query returns
/// only choices that can be selected right now.
#[derive(Clone, Copy, Default)]
pub struct ChoiceQuery<'a> {
    pub filter: Option<&'a dyn Fn(&ChoiceDefinition) -> bool>,
    pub include_disabled: bool,
    pub include_unavailable: bool,
}

impl<'a> ChoiceQuery<'a> {
    pub fn all() -> Self {
        Self {
            filter: None,
            include_disabled: true,
            include_unavailable: true,
        }
    }
}

#[derive(Clone)]
pub struct RunnerOptions {
    pub game_flags: Option<Arc<dyn FlagStore>>,
    pub speakers: BTreeMap<String, Speaker>,
    pub action_handlers: BTreeMap<String, ActionHandler>,
    pub interpolation_functions: BTreeMap<String, InterpolationFunction>,
    pub i18n: Option<Arc<dyn I18nAdapter>>,
    pub listeners: Vec<(EventKind, EventListener)>,
    /// Auto-advance hop ceiling. `None` disables the check.
    pub max_auto_advance: Option<usize>,
    pub listener_errors: ListenerErrorPolicy,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            game_flags: None,
            speakers: BTreeMap::new(),
            action_handlers: BTreeMap::new(),
            interpolation_functions: BTreeMap::new(),
            i18n: None,
            listeners: Vec::new(),
            max_auto_advance: Some(DEFAULT_MAX_AUTO_ADVANCE),
            listener_errors: ListenerErrorPolicy::default(),
        }
    }
}

impl RunnerOptions {
    /// Options seeded from a loaded config file. The initial game flags land
    /// in a fresh in-memory store.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            game_flags: Some(Arc::new(MemoryFlagStore::from_map(
                config.game_flags.clone(),
            ))),
            speakers: config.speakers.clone(),
            max_auto_advance: config.auto_advance_limit(),
            listener_errors: config.listener_errors,
            ..Self::default()
        }
    }
}

/// Walks one dialogue graph at a time.
///
/// Game flags are shared with the host and outlive the runner. Conversation
/// flags and history belong to the runner and are reset by `start` and
/// `restart`.
pub struct DialogueRunner {
    game_flags: Arc<dyn FlagStore>,
    conversation_flags: Arc<MemoryFlagStore>,
    speakers: BTreeMap<String, Speaker>,
    action_handlers: BTreeMap<String, ActionHandler>,
    interpolation_functions: BTreeMap<String, InterpolationFunction>,
    i18n: Option<Arc<dyn I18nAdapter>>,
    events: EventDispatcher,
    max_auto_advance: Option<usize>,

    dialogue: Option<Arc<DialogueDefinition>>,
    current: Option<CurrentNode>,
    history: Vec<HistoryEntry>,
    ended: bool,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod snapshot_tests;

#[cfg(test)]
pub(super) mod runner_test_support {
    use std::sync::Mutex;

    use super::*;
    pub(super) use bl_core::FlagValue;

    pub(super) fn dialogue(json: &str) -> DialogueDefinition {
        serde_json::from_str(json).expect("dialogue should parse")
    }

    pub(super) fn greeting_dialogue() -> DialogueDefinition {
        dialogue(
            r#"{
  "id": "t",
  "startNode": "s",
  "nodes": {
    "s": {"text": "Hi {{n}}", "choices": [{"text": "go", "next": "e"}]},
    "e": {"text": "Bye", "isEnd": true}
  }
}"#,
        )
    }

    /// Three-node branch with a flag-gated option and a disabled option.
    pub(super) fn tavern_dialogue() -> DialogueDefinition {
        dialogue(
            r#"{
  "id": "tavern",
  "startNode": "door",
  "nodes": {
    "door": {
      "text": "{{speaker}}: Welcome.",
      "speaker": "keeper",
      "actions": [{"type": "increment", "flag": "visits"}],
      "choices": [
        {"text": "Order ale", "next": "bar", "actions": [{"type": "set", "flag": "conv:ordered", "value": true}]},
        {"text": "Flash gold", "next": "bar", "condition": {"check": ["gold", ">=", 10]}},
        {"text": "Sneak out back", "next": "alley", "disabled": true},
        {"text": "Leave", "next": "street"}
      ]
    },
    "bar": {
      "text": "Ordered: {{conv:ordered}}",
      "choices": [{"text": "Step outside", "next": "street"}]
    },
    "alley": {"text": "Dark.", "isEnd": true},
    "street": {"text": "The street.", "next": "home"},
    "home": {"text": "Home again.", "isEnd": true}
  }
}"#,
        )
    }

    pub(super) fn runner() -> DialogueRunner {
        DialogueRunner::new(RunnerOptions::default()).expect("runner should build")
    }

    pub(super) fn runner_with_flags(entries: &[(&str, FlagValue)]) -> DialogueRunner {
        let store = MemoryFlagStore::from_entries(
            entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone())),
        );
        let mut speakers = BTreeMap::new();
        speakers.insert("keeper".to_string(), Speaker::named("Marta"));
        DialogueRunner::new(RunnerOptions {
            game_flags: Some(Arc::new(store)),
            speakers,
            ..RunnerOptions::default()
        })
        .expect("runner should build")
    }

    pub(super) type EventLog = Arc<Mutex<Vec<String>>>;

    pub(super) fn event_label(event: &DialogueEvent) -> String {
        match event {
            DialogueEvent::DialogueStarted { dialogue_id } => format!("started:{}", dialogue_id),
            DialogueEvent::NodeEntered { node } => format!("entered:{}", node.id),
            DialogueEvent::NodeExited { node_id } => format!("exited:{}", node_id),
            DialogueEvent::ChoiceSelected { choice_index, .. } => {
                format!("chose:{}", choice_index)
            }
            DialogueEvent::DialogueEnded { node_id, .. } => format!("ended:{}", node_id),
            DialogueEvent::ActionExecuted { action, .. } => {
                format!("action:{}", action.kind_name())
            }
            DialogueEvent::ConditionEvaluated {
                choice_index,
                result,
                ..
            } => format!("condition:{}={}", choice_index, result),
        }
    }

    pub(super) fn record_all(runner: &mut DialogueRunner) -> EventLog {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::DialogueStarted,
            EventKind::NodeEntered,
            EventKind::NodeExited,
            EventKind::ChoiceSelected,
            EventKind::DialogueEnded,
            EventKind::ActionExecuted,
            EventKind::ConditionEvaluated,
        ] {
            let sink = Arc::clone(&log);
            runner.on(
                kind,
                Arc::new(move |event: &DialogueEvent| {
                    sink.lock().expect("log lock").push(event_label(event));
                    Ok(())
                }),
            );
        }
        log
    }

    pub(super) fn drain(log: &EventLog) -> Vec<String> {
        std::mem::take(&mut *log.lock().expect("log lock"))
    }

    pub(super) fn current_text(runner: &DialogueRunner) -> String {
        runner
            .get_current_node()
            .map(|node| node.text.clone())
            .expect("runner should sit on a node")
    }

    pub(super) fn current_id(runner: &DialogueRunner) -> String {
        runner
            .get_current_node()
            .map(|node| node.id.clone())
            .expect("runner should sit on a node")
    }
}
