mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{inputs::InputsArgs, jobs::JobsArgs, run::RunArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "reportsizedeltas",
    about = "Report library example compile results to pull requests or a file",
    version,
    propagate_version = true
)]
struct Cli {
    /// Checked-out repository (default: walk up from cwd to the directory holding action.yml)
    #[arg(long, global = true, env = "GITHUB_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Debug logging
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the report for the triggering event (the action entrypoint)
    Run(RunArgs),

    /// Resolve the action inputs declared in action.yml
    Inputs(InputsArgs),

    /// Show which test workflow jobs run for an event
    Jobs(JobsArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        match &cli.command {
            Commands::Run(_) => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let workspace = root::resolve_workspace(cli.workspace.as_deref());

    let result = match cli.command {
        Commands::Run(args) => cmd::run::run(&workspace, args, cli.json),
        Commands::Inputs(args) => cmd::inputs::run(&workspace, args, cli.json),
        Commands::Jobs(args) => cmd::jobs::run(&workspace, args, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
