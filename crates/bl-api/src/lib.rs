use bl_core::{DialogueDefinition, DialogueError, DialogueView, RunnerConfig, SerializedState};
use bl_runtime::{validate_dialogue, DialogueRunner, RunnerOptions};
use tracing::debug;

#[derive(Clone, Default)]
pub struct CreateRunnerFromJsonOptions {
    pub dialogue_json: String,
    pub runner: RunnerOptions,
    /// Refuse dialogues that fail the static graph check instead of
    /// discovering problems mid-traversal.
    pub strict: bool,
}

#[derive(Clone, Default)]
pub struct ResumeRunnerFromJsonOptions {
    pub dialogue_json: String,
    pub state_json: String,
    pub runner: RunnerOptions,
}

pub fn parse_dialogue_json(source: &str) -> Result<DialogueDefinition, DialogueError> {
    serde_json::from_str(source).map_err(|error| {
        DialogueError::validation(
            "API_DIALOGUE_INVALID",
            format!("Dialogue JSON is invalid: {}", error),
        )
    })
}

pub fn parse_state_json(source: &str) -> Result<SerializedState, DialogueError> {
    serde_json::from_str(source).map_err(|error| {
        DialogueError::validation(
            "API_STATE_INVALID",
            format!("Saved state JSON is invalid: {}", error),
        )
    })
}

pub fn load_runner_config(source: &str) -> Result<RunnerConfig, DialogueError> {
    toml::from_str(source).map_err(|error| {
        DialogueError::validation(
            "API_CONFIG_INVALID",
            format!("Runner config is invalid: {}", error),
        )
    })
}

pub async fn create_runner_from_json(
    options: CreateRunnerFromJsonOptions,
) -> Result<(DialogueRunner, DialogueView), DialogueError> {
    let dialogue = parse_dialogue_json(&options.dialogue_json)?;

    if options.strict {
        let report = validate_dialogue(&dialogue);
        if let Some(issue) = report.errors.first() {
            return Err(DialogueError::structure(
                issue.code.clone(),
                issue.message.clone(),
            ));
        }
    }

    let mut runner = DialogueRunner::new(options.runner)?;
    debug!(dialogue = %dialogue.id, "starting runner from json");
    let view = runner.start(dialogue).await?;
    Ok((runner, view))
}

pub async fn resume_runner_from_json(
    options: ResumeRunnerFromJsonOptions,
) -> Result<(DialogueRunner, DialogueView), DialogueError> {
    let dialogue = parse_dialogue_json(&options.dialogue_json)?;
    let state = parse_state_json(&options.state_json)?;

    let mut runner = DialogueRunner::new(options.runner)?;
    let view = runner.resume(dialogue, state).await?;
    Ok((runner, view))
}
