//! sensilog - sensitivity and performance log
//!
//! Records device/sensitivity configurations and match results, and reports
//! how performance changed across configuration periods.

mod account;
mod matches;
mod output;
mod report;
mod settings;
mod time;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensilog_core::{Config, Database};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "sensilog")]
#[command(about = "Track sensitivity settings and correlate them with match performance")]
#[command(version)]
struct Args {
    /// User whose records to read and write (defaults to profile.user_id)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record and inspect device/sensitivity configurations
    #[command(subcommand)]
    Settings(settings::SettingsCommand),

    /// Import and inspect match results
    #[command(subcommand)]
    Matches(matches::MatchesCommand),

    /// Performance analytics across configuration periods
    #[command(subcommand)]
    Analytics(report::AnalyticsCommand),

    /// Link a game account through OAuth
    #[command(subcommand)]
    Account(account::AccountCommand),
}

/// Everything a command needs to run.
pub struct App {
    pub db: Database,
    pub config: Config,
    pub user_id: String,
    pub format: OutputFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        sensilog_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let user_id = args
        .user
        .unwrap_or_else(|| config.profile.user_id.clone());

    let app = App {
        db,
        config,
        user_id,
        format: args.format,
    };

    match args.command {
        Command::Settings(cmd) => settings::run(&app, cmd),
        Command::Matches(cmd) => matches::run(&app, cmd),
        Command::Analytics(cmd) => report::run(&app, cmd),
        Command::Account(cmd) => account::run(&app, cmd),
    }
}
