use std::io::{self, BufRead, Write};
use std::path::Path;

use bl_core::{DialogueError, DialogueView};
use bl_runtime::{DialogueRunner, RestartOptions};

use crate::{
    load_dialogue, load_runner_from_state, map_play_io, save_runner_state, start_runner,
    LineCommandAction, LineCommandContext, LoadedDialogue, PlayArgs,
};

pub(crate) const PLAY_COMMANDS: &str = "commands: :help :back :save :load :restart :flags :quit";
const DEFAULT_STATE_FILE: &str = ".branchline/save.json";

pub(crate) async fn run_play(args: PlayArgs) -> Result<i32, DialogueError> {
    let loaded = load_dialogue(&args.dialogue, args.config.as_deref())?;
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let (mut runner, _) = start_runner(&loaded).await?;

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_play_with_io(&state_file, &loaded, &mut runner, &mut reader, &mut writer).await
}

pub(crate) async fn run_play_with_io(
    state_file: &str,
    loaded: &LoadedDialogue,
    runner: &mut DialogueRunner,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, DialogueError> {
    writeln!(writer, "Branchline: {}", loaded.dialogue.id).map_err(map_play_io)?;
    writeln!(writer, "{}", PLAY_COMMANDS).map_err(map_play_io)?;
    let context = LineCommandContext { state_file, loaded };

    loop {
        let view = runner.view()?;
        render_view(&view, writer)?;
        if view.is_ended {
            writeln!(writer, "[END]").map_err(map_play_io)?;
            return Ok(0);
        }

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let raw = raw.trim();
            match handle_line_command(raw, &context, runner, writer).await? {
                LineCommandAction::Continue => continue,
                LineCommandAction::Refresh => break,
                LineCommandAction::Quit => return Ok(0),
                LineCommandAction::NotHandled => {}
            }

            if view.available_choices.is_empty() {
                writeln!(writer, "no choices here; try :back, :restart or :quit")
                    .map_err(map_play_io)?;
                continue;
            }
            let choice = raw.parse::<usize>().map_err(|_| {
                DialogueError::validation(
                    "PLAY_CHOICE_PARSE",
                    format!("Invalid choice index: {}", raw),
                )
            })?;
            runner.choose(choice).await?;
            break;
        }
    }
}

fn render_view(view: &DialogueView, writer: &mut dyn Write) -> Result<(), DialogueError> {
    writeln!(writer).map_err(map_play_io)?;
    if let Some(node) = &view.current_node {
        match &node.speaker {
            Some(speaker) => writeln!(writer, "{}: {}", speaker.name, node.text),
            None => writeln!(writer, "{}", node.text),
        }
        .map_err(map_play_io)?;
    }
    for (index, choice) in view.available_choices.iter().enumerate() {
        writeln!(writer, "  [{}] {}", index, choice.text).map_err(map_play_io)?;
    }
    Ok(())
}

pub(crate) async fn handle_line_command(
    raw: &str,
    context: &LineCommandContext<'_>,
    runner: &mut DialogueRunner,
    writer: &mut dyn Write,
) -> Result<LineCommandAction, DialogueError> {
    let (message, action) = match raw {
        ":help" => (PLAY_COMMANDS.to_string(), LineCommandAction::Continue),
        ":back" => {
            runner.back().await?;
            ("back".to_string(), LineCommandAction::Refresh)
        }
        ":save" => {
            save_runner_state(Path::new(context.state_file), runner, context.loaded)?;
            (
                format!("saved: {}", context.state_file),
                LineCommandAction::Continue,
            )
        }
        ":load" => {
            let (loaded, resumed, _) = load_runner_from_state(Path::new(context.state_file)).await?;
            if loaded.path != context.loaded.path {
                return Err(DialogueError::validation(
                    "PLAY_STATE_DIALOGUE_MISMATCH",
                    format!(
                        "State dialogue mismatch. expected={} actual={}",
                        context.loaded.path, loaded.path
                    ),
                ));
            }
            *runner = resumed;
            (
                format!("loaded: {}", context.state_file),
                LineCommandAction::Refresh,
            )
        }
        ":restart" => {
            runner.restart(RestartOptions::default()).await?;
            ("restarted".to_string(), LineCommandAction::Refresh)
        }
        ":flags" => (
            format!(
                "game: {}\nconversation: {}",
                serde_json::to_string(&runner.game_flags().read_all()).expect("flag json"),
                serde_json::to_string(&runner.get_conversation_flags()).expect("flag json")
            ),
            LineCommandAction::Continue,
        ),
        ":quit" => ("bye".to_string(), LineCommandAction::Quit),
        _ => return Ok(LineCommandAction::NotHandled),
    };
    writeln!(writer, "{}", message).map_err(map_play_io)?;
    Ok(action)
}

/// Returns `None` once the input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, DialogueError> {
    write!(writer, "{}", prefix).map_err(map_play_io)?;
    writer.flush().map_err(map_play_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_play_io)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
