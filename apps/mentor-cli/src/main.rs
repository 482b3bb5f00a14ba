//! # mentor-cli
//!
//! Command-line front end for Lifelong Mentor.
//!
//! - `mentor auth sign-up/sign-in/sign-out/whoami` — account and session
//! - `mentor onboard` — first-run setup (username, website, avatar)
//! - `mentor profile show/set/avatar` — profile maintenance
//! - `mentor goal list/add/show/edit/done/reopen/delete` — goals
//! - `mentor step add/done/undo/rename/delete/suggest` — steps of a goal

mod commands;
mod session_file;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mentor_app::{AppConfig, AppContext};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::session_file::SessionFile;

/// Lifelong Mentor — set goals, break them into steps, and track progress.
#[derive(Parser)]
#[command(name = "mentor", version, about)]
struct Cli {
    /// Path to mentor.toml (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the signed-in session is kept between runs.
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, sign in, sign out.
    Auth {
        #[command(subcommand)]
        command: commands::auth::AuthCommands,
    },
    /// Complete first-run setup.
    Onboard(commands::onboard::OnboardArgs),
    /// View and edit your profile.
    Profile {
        #[command(subcommand)]
        command: commands::profile::ProfileCommands,
    },
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Manage the steps of a goal.
    Step {
        #[command(subcommand)]
        command: commands::step::StepCommands,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.clone().or_else(AppConfig::default_path);
    let config = AppConfig::resolve(config_path.as_deref()).context("failed to load configuration")?;

    let session_path = cli
        .session_file
        .clone()
        .or_else(SessionFile::default_path)
        .context("no platform config directory; pass --session-file")?;
    let session_file = SessionFile::new(session_path);
    let resumed = session_file.load()?;

    let mut ctx = AppContext::from_config(&config, resumed)?;
    commands::refresh_if_expired(&ctx).await;
    ctx.start().await;

    let result = match &cli.command {
        Commands::Auth { command } => commands::auth::execute(command, &ctx).await,
        Commands::Onboard(args) => commands::onboard::execute(args, &ctx).await,
        Commands::Profile { command } => commands::profile::execute(command, &ctx).await,
        Commands::Goal { command } => commands::goal::execute(command, &ctx).await,
        Commands::Step { command } => commands::step::execute(command, &ctx).await,
    };

    // The gateway holds the authoritative session (sign-in, sign-out, refresh).
    session_file.save(ctx.gateway().session().await.as_ref())?;
    result
}
