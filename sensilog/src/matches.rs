//! `sensilog matches` - match records

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use sensilog_core::analytics::PerformanceMetrics;
use sensilog_core::format::format_timestamp;
use sensilog_core::{AnalyticsService, DateRange, MatchFilter, NewMatch};

use crate::output::{print_json, OutputFormat};
use crate::time::parse_time;
use crate::App;

#[derive(Subcommand)]
pub enum MatchesCommand {
    /// Import matches from a JSON array file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// List matches, newest first
    List(FilterArgs),

    /// Aggregate statistics for matching games
    Stats(FilterArgs),

    /// Delete a match
    Remove {
        /// Match record ID
        id: String,
    },
}

#[derive(Args)]
pub struct FilterArgs {
    /// Only matches starting at or after this time
    #[arg(long, value_parser = parse_time)]
    from: Option<DateTime<Utc>>,

    /// Only matches starting at or before this time
    #[arg(long, value_parser = parse_time)]
    to: Option<DateTime<Utc>>,

    /// Only matches played on this agent
    #[arg(long)]
    agent: Option<String>,

    /// Only matches played on this map
    #[arg(long)]
    map: Option<String>,
}

impl From<FilterArgs> for MatchFilter {
    fn from(args: FilterArgs) -> Self {
        MatchFilter {
            range: DateRange::new(args.from, args.to),
            agent_name: args.agent,
            map_name: args.map,
        }
    }
}

pub fn run(app: &App, cmd: MatchesCommand) -> Result<()> {
    match cmd {
        MatchesCommand::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let forms: Vec<NewMatch> = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", file.display()))?;

            let summary = app
                .db
                .import_matches(&app.user_id, forms)
                .context("failed to import matches")?;

            match app.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "inserted": summary.inserted,
                    "duplicates": summary.duplicates,
                }))?,
                OutputFormat::Text => println!(
                    "Imported {} match(es), skipped {} duplicate(s)",
                    summary.inserted, summary.duplicates
                ),
            }
        }
        MatchesCommand::List(filter) => {
            let matches = app
                .db
                .list_matches(&app.user_id, &filter.into())
                .context("failed to list matches")?;
            match app.format {
                OutputFormat::Json => print_json(&matches)?,
                OutputFormat::Text => {
                    if matches.is_empty() {
                        println!("No matches found.");
                        return Ok(());
                    }
                    println!(
                        "{:<16}  {:<10}  {:<10}  {:>8}  {:>5}  {:>6}  {:>5}  RESULT",
                        "STARTED", "MAP", "AGENT", "K/D/A", "K/D", "HS%", "ADR"
                    );
                    for m in &matches {
                        println!(
                            "{:<16}  {:<10}  {:<10}  {:>8}  {:>5.2}  {:>6.1}  {:>5.0}  {}",
                            format_timestamp(m.game_start_time),
                            m.map_name,
                            m.agent_name,
                            format!("{}/{}/{}", m.kills, m.deaths, m.assists),
                            m.kd_ratio.unwrap_or(0.0),
                            m.headshot_percentage.unwrap_or(0.0),
                            m.adr.unwrap_or(0.0),
                            if m.team_won { "win" } else { "loss" }
                        );
                    }
                    println!("\n{} match(es)", matches.len());
                }
            }
        }
        MatchesCommand::Stats(filter) => {
            let service = AnalyticsService::new(&app.db, app.config.analytics.clone());
            let stats = service
                .match_stats(&app.user_id, &filter.into())
                .context("failed to compute match stats")?;
            match app.format {
                OutputFormat::Json => print_json(&stats)?,
                OutputFormat::Text => {
                    println!("Matches: {}", stats.total_matches);
                    print_performance(&stats.performance);
                }
            }
        }
        MatchesCommand::Remove { id } => {
            app.db
                .delete_match(&app.user_id, &id)
                .with_context(|| format!("failed to remove match {}", id))?;
            match app.format {
                OutputFormat::Json => print_json(&serde_json::json!({ "removed": id }))?,
                OutputFormat::Text => println!("Removed match {}", id),
            }
        }
    }
    Ok(())
}

/// Print aggregate metrics as an indented block.
pub fn print_performance(p: &PerformanceMetrics) {
    println!("  Avg kills:     {:.2}", p.avg_kills);
    println!("  Avg deaths:    {:.2}", p.avg_deaths);
    println!("  Avg assists:   {:.2}", p.avg_assists);
    println!("  K/D:           {:.2}", p.avg_kd_ratio);
    println!("  Headshot %:    {:.1}", p.avg_headshot_percentage);
    println!("  Combat score:  {:.0}", p.avg_combat_score);
    println!("  ADR:           {:.1}", p.avg_adr);
    println!("  Win rate:      {:.1}%", p.win_rate);
}
