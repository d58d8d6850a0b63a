//! `sensilog analytics` - performance reports

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use sensilog_core::analytics::{PerformanceAnalytics, PerformanceComparison, WindowPerformance};
use sensilog_core::format::{
    format_change_percent, format_correlation, format_points, format_timestamp,
};
use sensilog_core::{AnalyticsService, ComparisonWindow, DateRange};

use crate::matches::print_performance;
use crate::output::{print_json, OutputFormat};
use crate::time::parse_time;
use crate::App;

#[derive(Subcommand)]
pub enum AnalyticsCommand {
    /// Performance per configuration period, trends and correlations
    Performance {
        /// Only matches starting at or after this time
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,

        /// Only matches starting at or before this time
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,
    },

    /// Compare performance between two time windows
    Compare {
        #[arg(long, value_parser = parse_time)]
        from1: DateTime<Utc>,

        #[arg(long, value_parser = parse_time)]
        to1: DateTime<Utc>,

        #[arg(long, value_parser = parse_time)]
        from2: DateTime<Utc>,

        #[arg(long, value_parser = parse_time)]
        to2: DateTime<Utc>,
    },
}

pub fn run(app: &App, cmd: AnalyticsCommand) -> Result<()> {
    let service = AnalyticsService::new(&app.db, app.config.analytics.clone());

    match cmd {
        AnalyticsCommand::Performance { from, to } => {
            let report = service
                .performance_analytics(&app.user_id, &DateRange::new(from, to), Utc::now())
                .context("failed to compute performance analytics")?;
            match app.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_analytics(&report),
            }
        }
        AnalyticsCommand::Compare {
            from1,
            to1,
            from2,
            to2,
        } => {
            let first = ComparisonWindow::new(from1, to1).context("invalid first window")?;
            let second = ComparisonWindow::new(from2, to2).context("invalid second window")?;
            let result = service
                .compare_performance(&app.user_id, &first, &second)
                .context("failed to compare performance")?;
            match app.format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => print_comparison(&result),
            }
        }
    }
    Ok(())
}

fn print_analytics(report: &PerformanceAnalytics) {
    if report.settings_periods.is_empty() {
        println!("No configuration periods with matches.");
        println!("Record settings with 'sensilog settings add' and import matches first.");
    }

    for period in &report.settings_periods {
        println!(
            "Sensitivity {} @ {} DPI  ({} -> {}, {} match(es))",
            period.sensitivity,
            period.dpi,
            format_timestamp(period.start),
            format_timestamp(period.end),
            period.match_count
        );
        print_performance(&period.performance);
        println!();
    }

    match &report.overall_trends {
        Some(trends) => {
            println!(
                "Trends (last {} vs previous {} matches):",
                trends.recent_matches, trends.older_matches
            );
            println!(
                "  K/D:           {}",
                format_change_percent(trends.kd_ratio_trend_percent)
            );
            println!("  Headshot %:    {}", format_points(trends.headshot_trend));
            println!("  Win rate:      {}", format_points(trends.win_rate_trend));
        }
        None => println!("Trends: insufficient data"),
    }

    match &report.correlations {
        Some(correlations) => {
            println!("\nCorrelations:");
            for (name, correlation) in correlations {
                println!("  {:<34} {}", name, format_correlation(*correlation));
            }
        }
        None => println!("Correlations: insufficient data"),
    }
}

fn print_window(label: &str, window: &WindowPerformance) {
    println!(
        "{} ({} -> {}, {} match(es))",
        label,
        format_timestamp(window.start),
        format_timestamp(window.end),
        window.match_count
    );
    if let Some(settings) = &window.settings {
        println!(
            "  Settings:      {} @ {} DPI (eDPI {:.1})",
            settings.sensitivity,
            settings.dpi,
            settings.edpi()
        );
    }
    print_performance(&window.performance);
}

fn print_comparison(result: &PerformanceComparison) {
    print_window("Period 1", &result.period1);
    println!();
    print_window("Period 2", &result.period2);
    println!();

    let c = &result.comparison;
    println!("Change from period 1 to period 2:");
    println!("  K/D:           {}", format_change_percent(c.kd_ratio_diff));
    println!("  Combat score:  {}", format_change_percent(c.combat_score_diff));
    println!("  ADR:           {}", format_change_percent(c.adr_diff));
    println!("  Headshot %:    {}", format_points(c.headshot_diff));
    println!("  Win rate:      {}", format_points(c.win_rate_diff));
}
