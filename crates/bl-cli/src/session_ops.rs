use std::path::Path;
use std::sync::Arc;

use bl_api::{create_runner_from_json, CreateRunnerFromJsonOptions};
use bl_core::{DialogueError, DialogueView, FlagMap, MemoryFlagStore};
use bl_runtime::{DialogueRunner, RunnerOptions};

use crate::{
    boundary_from_view, emit_boundary, load_dialogue, load_player_state, save_player_state,
    BoundaryEvent, LoadedDialogue, PlayerState, PLAYER_STATE_SCHEMA,
};

/// Runner options for a CLI session. Saved game flags replace the ones
/// seeded by the config file.
pub(crate) fn runner_options(loaded: &LoadedDialogue, game_flags: Option<FlagMap>) -> RunnerOptions {
    let mut options = RunnerOptions::from_config(&loaded.config);
    if let Some(flags) = game_flags {
        options.game_flags = Some(Arc::new(MemoryFlagStore::from_map(flags)));
    }
    options
}

pub(crate) async fn start_runner(
    loaded: &LoadedDialogue,
) -> Result<(DialogueRunner, DialogueView), DialogueError> {
    create_runner_from_json(CreateRunnerFromJsonOptions {
        dialogue_json: loaded.source.clone(),
        runner: runner_options(loaded, None),
        strict: false,
    })
    .await
}

pub(crate) async fn resume_runner_for_state(
    state: &PlayerState,
) -> Result<(LoadedDialogue, DialogueRunner, DialogueView), DialogueError> {
    let loaded = load_dialogue(&state.dialogue_path, state.config_path.as_deref())?;
    let mut runner = DialogueRunner::new(runner_options(&loaded, Some(state.game_flags.clone())))?;
    let view = runner
        .resume(loaded.dialogue.clone(), state.state.clone())
        .await?;
    Ok((loaded, runner, view))
}

pub(crate) async fn load_runner_from_state(
    path: &Path,
) -> Result<(LoadedDialogue, DialogueRunner, DialogueView), DialogueError> {
    let state = load_player_state(path)?;
    resume_runner_for_state(&state).await
}

pub(crate) fn save_runner_state(
    path: &Path,
    runner: &DialogueRunner,
    loaded: &LoadedDialogue,
) -> Result<(), DialogueError> {
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        dialogue_path: loaded.path.clone(),
        config_path: loaded.config_path.clone(),
        game_flags: runner.game_flags().read_all(),
        state: runner.serialize()?,
    };
    save_player_state(path, &state)
}

pub(crate) fn emit_view_with_saved_state(
    runner: &DialogueRunner,
    loaded: &LoadedDialogue,
    view: &DialogueView,
    state_out: &str,
) -> Result<i32, DialogueError> {
    let boundary = boundary_from_view(view);
    if boundary.event == BoundaryEvent::End {
        emit_boundary(&boundary, None);
        return Ok(0);
    }

    save_runner_state(Path::new(state_out), runner, loaded)?;
    emit_boundary(&boundary, Some(state_out));
    Ok(0)
}
