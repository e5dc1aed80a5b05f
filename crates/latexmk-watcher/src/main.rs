//! latexmk-watcher - A latexmk watcher that makes LaTeX development smoother
//!
//! Keeps latexmk building a document in the background and opens the
//! compiled PDF in a previewer every time it is rebuilt.

mod cli;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use latexmk_watcher_core::system::check_system;
use latexmk_watcher_core::ProjectContext;

fn main() {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{}", format!("{:#}", e).red());
        process::exit(1);
    }
}

fn run() -> Result<()> {
    check_system()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                e.print()?;
                process::exit(0);
            }
            _ => {
                let _ = e.print();
                process::exit(1);
            }
        },
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { run_command(cli.command).await })
}

async fn run_command(command: Commands) -> Result<()> {
    let project = cli::discover_project()?;

    // init doesn't load the config: the existing file may be unparseable
    match command {
        Commands::Init { force } => cli::cmd_init(project, force),
        Commands::Env => cli::cmd_env(&ProjectContext::load(project)?).await,
        Commands::Watch { file } => {
            cli::cmd_watch(&ProjectContext::load(project)?, file.as_deref()).await
        }
        Commands::Release { file } => {
            cli::cmd_release(&ProjectContext::load(project)?, file.as_deref()).await
        }
        Commands::Clean { file } => {
            cli::cmd_clean(&ProjectContext::load(project)?, file.as_deref()).await
        }
    }
}
