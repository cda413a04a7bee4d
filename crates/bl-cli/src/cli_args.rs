use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "branchline")]
#[command(about = "Branchline dialogue runner CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Stateless, line-oriented protocol for scripted drivers.
    Agent(AgentArgs),
    /// Static graph check for one dialogue file or a directory of them.
    Validate(ValidateArgs),
    /// Interactive line mode.
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
    Back(BackArgs),
    Jump(JumpArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "dialogue")]
    pub(crate) dialogue: String,
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct BackArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct JumpArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "node")]
    pub(crate) node: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ValidateArgs {
    #[arg(long = "path")]
    pub(crate) path: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "dialogue")]
    pub(crate) dialogue: String,
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}
