use std::ffi::OsString;

use bl_core::DialogueError;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod agent;
mod boundary;
mod cli_args;
mod error_map;
mod line_play;
mod models;
mod session_ops;
mod source_loader;
mod state_store;
mod validate;

pub(crate) use boundary::{boundary_from_view, emit_boundary, json_string};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, BackArgs, ChooseArgs, Cli, JumpArgs, Mode, PlayArgs, StartArgs,
    ValidateArgs,
};
pub(crate) use error_map::{
    emit_error, map_cli_config_read, map_cli_dialogue_read, map_cli_source_path,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, map_play_io,
};
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, LineCommandAction, LineCommandContext, LoadedDialogue,
    PlayerState, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    emit_view_with_saved_state, load_runner_from_state, save_runner_state, start_runner,
};
pub(crate) use source_loader::{collect_dialogue_files, load_dialogue};
pub(crate) use state_store::{load_player_state, save_player_state};

/// Log filter variable, e.g. `BRANCHLINE_LOG=debug`.
pub const LOG_ENV: &str = "BRANCHLINE_LOG";

/// Installs the stderr subscriber. Stdout is reserved for the agent protocol.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli).await {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

async fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args).await,
        Mode::Validate(args) => validate::run_validate(args),
        Mode::Play(args) => line_play::run_play(args).await,
    }
}
