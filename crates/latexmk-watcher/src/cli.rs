//! CLI command definitions and handlers

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use latexmk_watcher_core::latexmk;
use latexmk_watcher_core::shell::{self, quote};
use latexmk_watcher_core::system::Platform;
use latexmk_watcher_core::{Config, Project, ProjectContext, Watcher, APP_NAME, VERSION};

/// latexmk-watcher - A latexmk watcher that makes LaTeX development smoother
#[derive(Parser)]
#[command(name = "latexmk-watcher")]
#[command(version)]
#[command(about = "A latexmk watcher that makes LaTeX development smoother")]
#[command(after_help = "EXAMPLES:\n\
    latexmk-watcher init             Create latexmk-watcher.config.json here\n\
    latexmk-watcher watch            Build and preview the default file\n\
    latexmk-watcher watch slides.tex Build and preview src/slides.tex\n\
    latexmk-watcher release          Copy build/main.pdf to release/\n\
    latexmk-watcher env              Show versions and the project directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a configuration file in the current working directory
    Init {
        /// Write the default configuration even if the configuration file already exists
        #[arg(short, long, default_value = "false")]
        force: bool,
    },

    /// Display the environment information
    Env,

    /// Build a tex file continuously and preview the output
    Watch {
        /// The tex file to watch, relative to the source directory
        file: Option<String>,
    },

    /// Copy a compiled PDF to the release directory
    Release {
        /// The tex file whose PDF is released
        file: Option<String>,
    },

    /// Remove files generated by latexmk
    Clean {
        /// The tex file to clean up after
        file: Option<String>,
    },
}

/// Locate the project from the current directory
pub fn discover_project() -> Result<Project> {
    Project::discover().context("Failed to get current directory")
}

/// Create the configuration file with the defaults
pub fn cmd_init(project: Project, force: bool) -> Result<()> {
    let path = project.config_path().to_path_buf();

    if project.exists() && !force {
        return Err(latexmk_watcher_core::Error::ConfigurationExists(path).into());
    }

    if force {
        // Overwrite without reading: the old file may be the reason for --force
        Config::default().save(&path)?;
    } else {
        Config::update(&path, |_| Some(Config::default()))?;
    }

    println!("Created configuration file: {}", path.display());
    Ok(())
}

/// Print versions and where the project is
pub async fn cmd_env(ctx: &ProjectContext) -> Result<()> {
    let latexmk_version = latexmk::version(&ctx.config().latexmk_command).await;

    println!("{}: {}", APP_NAME.bold(), VERSION);
    println!("{}: {}", "latexmk".bold(), latexmk_version);
    println!("{}", "-".repeat(79));
    println!("project directory: {}", ctx.project().dir().display());

    let config_path = ctx.project().config_path().display();
    if ctx.is_initialized() {
        println!("configuration file: {}", config_path);
    } else {
        println!("configuration file: {} {}", config_path, "(not initialized)".dimmed());
    }

    Ok(())
}

/// Everything `watch` needs to start, resolved from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPlan {
    /// latexmk invocation
    pub build_command: String,
    /// PDF the watcher polls
    pub artifact: PathBuf,
    pub interval: Duration,
}

pub fn plan_watch(ctx: &ProjectContext, file: Option<&str>) -> WatchPlan {
    let config = ctx.config();
    let file = config.input_file(file);
    let input = ctx.source_file(file);

    WatchPlan {
        build_command: latexmk::build_command(config, &input),
        artifact: ctx.artifact_path(file),
        interval: Duration::from_millis(config.watch_interval),
    }
}

/// Run latexmk in the background and open the PDF whenever it is rebuilt
pub async fn cmd_watch(ctx: &ProjectContext, file: Option<&str>) -> Result<()> {
    ctx.require_initialized()?;
    latexmk::ensure_installed(&ctx.config().latexmk_command).await?;
    let platform = Platform::current()?;

    let plan = plan_watch(ctx, file);
    debug!(?plan, "resolved watch plan");
    let project_dir = ctx.project().dir().to_path_buf();

    shell::print_executed_command(&plan.build_command);
    let builder = shell::spawn(&plan.build_command, &project_dir);

    let previewer = ctx.config().previewer.clone();
    let open_dir = project_dir.clone();
    let watcher = Watcher::new(&plan.artifact, plan.interval, move |artifact| {
        let command = platform.open_command(&previewer, artifact);
        print!("[{}] ", Local::now().format("%H:%M:%S"));
        shell::print_executed_command(&command);
        // Fire and forget; failures are logged by the executor
        drop(shell::spawn(&command, &open_dir));
    });
    let watch = watcher.start();

    println!(
        "Watching {} every {}ms. Press Ctrl+C to stop.",
        plan.artifact.display(),
        plan.interval.as_millis()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    watch.stop();
    builder.stop();
    Ok(())
}

/// Copy the compiled PDF into the release directory
pub async fn cmd_release(ctx: &ProjectContext, file: Option<&str>) -> Result<()> {
    let file = ctx.config().input_file(file);
    let pdf = ctx.artifact_path(file);
    let release = ctx.release_path(file);

    if !pdf.is_file() {
        bail!(
            "Nothing to release: {} does not exist. Build it with `watch` first.",
            pdf.display()
        );
    }

    if let Some(dir) = release.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let command = format!(
        "cp -f {} {}",
        quote(&pdf.to_string_lossy()),
        quote(&release.to_string_lossy())
    );
    shell::print_executed_command(&command);
    shell::run(&command, Some(ctx.project().dir()))
        .await
        .into_result(&command)?;

    println!("Released {}", release.display());
    Ok(())
}

/// Remove latexmk's generated files for a tex file
pub async fn cmd_clean(ctx: &ProjectContext, file: Option<&str>) -> Result<()> {
    ctx.require_initialized()?;

    let config = ctx.config();
    let input = ctx.source_file(config.input_file(file));
    let command = latexmk::clean_command(config, &input);

    shell::print_executed_command(&command);
    shell::run(&command, Some(ctx.project().dir()))
        .await
        .into_result(&command)?;
    Ok(())
}
