use std::path::Path;

use bl_api::{create_runner_from_json, load_runner_config, CreateRunnerFromJsonOptions};
use bl_core::{DialogueView, RunnerConfig};
use bl_runtime::{RestartOptions, RunnerOptions};

use crate::source::{read_demo_source, read_test_case};
use crate::{BlToolError, ExpectedEvent, TestAction, TestCase};

const NAVIGATION_ACTION_KINDS: &str = "back|jump|restart";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub boundaries: usize,
}

/// Drives the demo dialogue with the case's actions, recording what the
/// runner shows at every stop. The dialogue must pass strict validation.
///
/// Reaching the end with actions left is fine: `back`, `jump` and `restart`
/// may continue from an ended dialogue.
pub async fn run_case(demo_dir: &Path, case: &TestCase) -> Result<RunReport, BlToolError> {
    let source = read_demo_source(demo_dir)?;
    let mut config = match &source.config_toml {
        Some(raw) => load_runner_config(raw)?,
        None => RunnerConfig::default(),
    };
    for (key, value) in &case.game_flags {
        config.game_flags.insert(key.clone(), value.clone());
    }

    let (mut runner, mut view) = create_runner_from_json(CreateRunnerFromJsonOptions {
        dialogue_json: source.dialogue_json,
        runner: RunnerOptions::from_config(&config),
        strict: true,
    })
    .await?;

    let mut observed_events = Vec::new();
    let mut action_index = 0usize;

    loop {
        observe(&view, &mut observed_events);
        let event_index = observed_events.len() - 1;
        let accepts_choose = !view.is_ended && !view.available_choices.is_empty();

        let Some(action) = case.actions.get(action_index) else {
            if view.is_ended {
                let boundaries = observed_events
                    .iter()
                    .filter(|event| matches!(event, ExpectedEvent::Node { .. }))
                    .count();
                return Ok(RunReport {
                    observed_events,
                    consumed_actions: action_index,
                    boundaries,
                });
            }
            return Err(BlToolError::MissingAction {
                event_index,
                expected_action_kind: if accepts_choose {
                    "choose".to_string()
                } else {
                    NAVIGATION_ACTION_KINDS.to_string()
                },
            });
        };

        view = match action {
            TestAction::Choose { index } if accepts_choose => runner.choose(*index).await?,
            TestAction::Choose { .. } => {
                return Err(BlToolError::ActionKindMismatch {
                    event_index,
                    expected_action_kind: NAVIGATION_ACTION_KINDS.to_string(),
                    actual_action_kind: action.kind_name().to_string(),
                })
            }
            TestAction::Back => runner.back().await?,
            TestAction::Restart {
                preserve_conversation_flags,
            } => {
                runner
                    .restart(RestartOptions {
                        preserve_conversation_flags: *preserve_conversation_flags,
                    })
                    .await?
            }
            TestAction::Jump { node } => runner.jump_to(node).await?,
        };
        action_index += 1;
    }
}

fn observe(view: &DialogueView, observed_events: &mut Vec<ExpectedEvent>) {
    if let Some(node) = &view.current_node {
        observed_events.push(ExpectedEvent::Node {
            id: node.id.clone(),
            speaker: node.speaker.as_ref().map(|speaker| speaker.name.clone()),
            text: node.text.clone(),
        });
    }
    observed_events.push(if view.is_ended {
        ExpectedEvent::End
    } else if view.available_choices.is_empty() {
        ExpectedEvent::Stop
    } else {
        ExpectedEvent::Choices {
            choices: view
                .available_choices
                .iter()
                .map(|choice| choice.text.clone())
                .collect(),
        }
    });
}

pub async fn assert_case(demo_dir: &Path, case_path: &Path) -> Result<(), BlToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(demo_dir, &case).await?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(BlToolError::EventSerialize)?;
        return Err(BlToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(BlToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(BlToolError::EventSerialize)?;
            return Err(BlToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
