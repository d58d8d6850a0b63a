//! `sensilog settings` - configuration records

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use sensilog_core::format::{format_opt, format_timestamp};
use sensilog_core::{ConfigurationRecord, NewConfiguration};

use crate::output::{print_json, OutputFormat};
use crate::time::parse_time;
use crate::App;

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Record a new configuration
    Add(AddArgs),

    /// List configurations, newest first
    List,

    /// Show the configuration currently in force
    Latest,

    /// Delete a configuration
    Remove {
        /// Configuration ID
        id: String,
    },

    /// Known peripherals and tags for new records
    Suggestions,
}

#[derive(Args)]
pub struct AddArgs {
    /// In-game sensitivity
    #[arg(short, long)]
    sensitivity: f64,

    /// Mouse DPI
    #[arg(short, long)]
    dpi: u32,

    /// When the configuration took effect (defaults to now)
    #[arg(long, value_parser = parse_time)]
    at: Option<DateTime<Utc>>,

    #[arg(long)]
    scoped_sensitivity: Option<f64>,

    /// Windows pointer speed (1-11)
    #[arg(long)]
    windows_sensitivity: Option<u8>,

    #[arg(long)]
    windows_acceleration: Option<bool>,

    #[arg(long)]
    mouse: Option<String>,

    #[arg(long)]
    mousepad: Option<String>,

    #[arg(long)]
    keyboard: Option<String>,

    /// e.g. 1920x1080
    #[arg(long)]
    resolution: Option<String>,

    /// e.g. 16:9
    #[arg(long)]
    aspect_ratio: Option<String>,

    #[arg(long)]
    display_scaling: Option<String>,

    #[arg(long)]
    display_mode: Option<String>,

    #[arg(long)]
    raw_input_buffer: Option<bool>,

    #[arg(long)]
    inner_deadzone: Option<f64>,

    #[arg(long)]
    outer_deadzone: Option<f64>,

    #[arg(long)]
    comment: Option<String>,

    /// Free-form tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
}

impl From<AddArgs> for NewConfiguration {
    fn from(args: AddArgs) -> Self {
        NewConfiguration {
            sensitivity: args.sensitivity,
            dpi: args.dpi,
            created_at: args.at,
            scoped_sensitivity: args.scoped_sensitivity,
            windows_sensitivity: args.windows_sensitivity,
            windows_acceleration: args.windows_acceleration,
            mouse_device: args.mouse,
            mousepad: args.mousepad,
            keyboard_device: args.keyboard,
            screen_resolution: args.resolution,
            aspect_ratio: args.aspect_ratio,
            display_scaling: args.display_scaling,
            display_mode: args.display_mode,
            raw_input_buffer: args.raw_input_buffer,
            inner_deadzone: args.inner_deadzone,
            outer_deadzone: args.outer_deadzone,
            comment: args.comment,
            tags: args.tags,
        }
    }
}

pub fn run(app: &App, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Add(args) => {
            let record = app
                .db
                .create_configuration(&app.user_id, args.into(), Utc::now())
                .context("failed to record configuration")?;
            match app.format {
                OutputFormat::Json => print_json(&record)?,
                OutputFormat::Text => {
                    println!("Recorded configuration {}", record.id);
                    print_record(&record);
                }
            }
        }
        SettingsCommand::List => {
            let records = app
                .db
                .list_configurations(&app.user_id)
                .context("failed to list configurations")?;
            match app.format {
                OutputFormat::Json => print_json(&records)?,
                OutputFormat::Text => {
                    if records.is_empty() {
                        println!("No configurations recorded.");
                        println!("Run 'sensilog settings add --sensitivity S --dpi D' to add one.");
                        return Ok(());
                    }
                    println!(
                        "{:<36}  {:<16}  {:>6}  {:>6}  {:>7}  MOUSE",
                        "ID", "ACTIVE SINCE", "SENS", "DPI", "EDPI"
                    );
                    for r in &records {
                        println!(
                            "{:<36}  {:<16}  {:>6.3}  {:>6}  {:>7.1}  {}",
                            r.id,
                            format_timestamp(r.created_at),
                            r.sensitivity,
                            r.dpi,
                            r.edpi(),
                            format_opt(r.mouse_device.as_deref())
                        );
                    }
                }
            }
        }
        SettingsCommand::Latest => {
            let record = app
                .db
                .latest_configuration(&app.user_id)
                .context("failed to load latest configuration")?;
            match (app.format, record) {
                (OutputFormat::Json, record) => print_json(&record)?,
                (OutputFormat::Text, Some(record)) => print_record(&record),
                (OutputFormat::Text, None) => println!("No configurations recorded."),
            }
        }
        SettingsCommand::Remove { id } => {
            app.db
                .delete_configuration(&app.user_id, &id)
                .with_context(|| format!("failed to remove configuration {}", id))?;
            match app.format {
                OutputFormat::Json => print_json(&serde_json::json!({ "removed": id }))?,
                OutputFormat::Text => println!("Removed configuration {}", id),
            }
        }
        SettingsCommand::Suggestions => {
            let suggestions = app
                .db
                .device_suggestions()
                .context("failed to load suggestions")?;
            match app.format {
                OutputFormat::Json => print_json(&suggestions)?,
                OutputFormat::Text => {
                    println!("Mice:      {}", suggestions.mice.join(", "));
                    println!("Keyboards: {}", suggestions.keyboards.join(", "));
                    println!("Mousepads: {}", suggestions.mousepads.join(", "));
                    if !suggestions.tags.is_empty() {
                        println!("Tags:      {}", suggestions.tags.join(", "));
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_record(r: &ConfigurationRecord) {
    println!("  Active since:  {}", format_timestamp(r.created_at));
    println!("  Sensitivity:   {}", r.sensitivity);
    println!("  DPI:           {}", r.dpi);
    println!("  eDPI:          {:.1}", r.edpi());
    println!("  Scoped sens:   {}", format_opt(r.scoped_sensitivity));
    println!("  Mouse:         {}", format_opt(r.mouse_device.as_deref()));
    println!("  Mousepad:      {}", format_opt(r.mousepad.as_deref()));
    println!("  Keyboard:      {}", format_opt(r.keyboard_device.as_deref()));
    println!("  Resolution:    {}", format_opt(r.screen_resolution.as_deref()));
    if !r.tags.is_empty() {
        println!("  Tags:          {}", r.tags.join(", "));
    }
    if let Some(comment) = &r.comment {
        println!("  Comment:       {}", comment);
    }
}
