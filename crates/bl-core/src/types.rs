use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::flags::FlagMap;
use crate::value::FlagValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueDefinition {
    pub id: String,
    pub start_node: String,
    pub nodes: BTreeMap<String, NodeDefinition>,
}

impl DialogueDefinition {
    pub fn node(&self, node_id: &str) -> Option<&NodeDefinition> {
        self.nodes.get(node_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_end: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDefinition {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_key: Option<String>,
    pub next: String,
    #[serde(
        default,
        alias = "conditions",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }
}

/// Boolean expression gating a choice.
///
/// Shapes that match none of the known variants (including unknown
/// operators) land in `Unknown` and evaluate to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Check {
        check: (String, CompareOp, FlagValue),
    },
    And {
        and: Vec<Condition>,
    },
    Or {
        or: Vec<Condition>,
    },
    Not {
        not: Box<Condition>,
    },
    Unknown(serde_json::Value),
}

impl Condition {
    pub fn check(flag_ref: impl Into<String>, op: CompareOp, value: impl Into<FlagValue>) -> Self {
        Self::Check {
            check: (flag_ref.into(), op, value.into()),
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::And { and: conditions }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::Or { or: conditions }
    }

    pub fn negate(condition: Condition) -> Self {
        Self::Not {
            not: Box::new(condition),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Set {
        flag: String,
        value: FlagValue,
    },
    Increment {
        flag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
    },
    Decrement {
        flag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
    },
    Clear {
        flag: String,
    },
    Callback {
        handler: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<serde_json::Value>,
    },
}

impl Action {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Increment { .. } => "increment",
            Self::Decrement { .. } => "decrement",
            Self::Clear { .. } => "clear",
            Self::Callback { .. } => "callback",
        }
    }
}

/// What a single action produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActionOutcome {
    Set { value: FlagValue },
    Counter { value: f64 },
    Cleared { existed: bool },
    Callback { value: serde_json::Value },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Speaker {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The node the runner currently sits on, with its text already rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentNode {
    pub id: String,
    pub text: String,
    pub speaker: Option<Speaker>,
    pub node: NodeDefinition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnavailableReason {
    Disabled,
    ConditionFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    /// Position in the node's unfiltered choice list. Stable across filters.
    pub id: usize,
    pub text: String,
    pub next: String,
    pub available: bool,
    pub reason: Option<UnavailableReason>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueView {
    pub current_node: Option<CurrentNode>,
    pub available_choices: Vec<ChoiceView>,
    pub is_ended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub node_id: String,
    pub node: NodeDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<ChoiceDefinition>,
    pub timestamp: i64,
    pub conversation_flags: FlagMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedState {
    pub dialogue_id: String,
    pub current_node_id: String,
    pub history: Vec<HistoryEntry>,
    pub conversation_flags: FlagMap,
}
