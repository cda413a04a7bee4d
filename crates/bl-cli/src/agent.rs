use std::path::Path;

use bl_core::DialogueError;
use tracing::debug;

use crate::{
    emit_view_with_saved_state, load_dialogue, load_runner_from_state, start_runner, AgentArgs,
    AgentCommand, BackArgs, ChooseArgs, JumpArgs, StartArgs,
};

enum Transition {
    Choose(usize),
    Back,
    Jump(String),
}

pub(super) async fn run_agent(args: AgentArgs) -> Result<i32, DialogueError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args).await,
        AgentCommand::Choose(args) => run_choose(args).await,
        AgentCommand::Back(args) => run_back(args).await,
        AgentCommand::Jump(args) => run_jump(args).await,
    }
}

pub(super) async fn run_start(args: StartArgs) -> Result<i32, DialogueError> {
    let loaded = load_dialogue(&args.dialogue, args.config.as_deref())?;
    let (runner, view) = start_runner(&loaded).await?;
    emit_view_with_saved_state(&runner, &loaded, &view, &args.state_out)
}

pub(super) async fn run_choose(args: ChooseArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, Transition::Choose(args.choice)).await
}

pub(super) async fn run_back(args: BackArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, Transition::Back).await
}

pub(super) async fn run_jump(args: JumpArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, Transition::Jump(args.node)).await
}

async fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: Transition,
) -> Result<i32, DialogueError> {
    let (loaded, mut runner, _) = load_runner_from_state(Path::new(state_in)).await?;
    debug!(dialogue = %loaded.dialogue.id, state_in, "resumed agent session");
    let view = match transition {
        Transition::Choose(index) => runner.choose(index).await?,
        Transition::Back => runner.back().await?,
        Transition::Jump(node_id) => runner.jump_to(&node_id).await?,
    };
    emit_view_with_saved_state(&runner, &loaded, &view, state_out)
}
