use bl_core::{DialogueDefinition, FlagMap, RunnerConfig, SerializedState};
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "player-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedDialogue {
    /// Absolute path, so saved states can be resumed from any directory.
    pub(crate) path: String,
    pub(crate) config_path: Option<String>,
    pub(crate) source: String,
    pub(crate) dialogue: DialogueDefinition,
    pub(crate) config: RunnerConfig,
}

/// On-disk session: the runner's own state plus the game flags the CLI
/// owns on behalf of the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) dialogue_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) config_path: Option<String>,
    pub(crate) game_flags: FlagMap,
    pub(crate) state: SerializedState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Choices,
    /// Active node with nothing to pick; only `back` or `jump` can move on.
    Stop,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) node_id: Option<String>,
    pub(crate) speaker: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) choices: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineCommandAction {
    NotHandled,
    Continue,
    Refresh,
    Quit,
}

pub(crate) struct LineCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) loaded: &'a LoadedDialogue,
}
