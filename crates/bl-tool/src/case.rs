use bl_core::FlagMap;
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "bl-tool-case.v1";

/// Scripted walk through one demo dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Merged over the game flags seeded by `runner.toml`.
    #[serde(default)]
    pub game_flags: FlagMap,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Choose {
        index: usize,
    },
    Back,
    Restart {
        #[serde(default, rename = "preserveConversationFlags")]
        preserve_conversation_flags: bool,
    },
    Jump {
        node: String,
    },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::Back => "back",
            Self::Restart { .. } => "restart",
            Self::Jump { .. } => "jump",
        }
    }
}

/// One observation per boundary the runner stops at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Node {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        text: String,
    },
    Choices {
        choices: Vec<String>,
    },
    /// Active node without available choices.
    Stop,
    End,
}
