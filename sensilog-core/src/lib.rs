//! # sensilog-core
//!
//! Core library for sensilog - a sensitivity and device configuration log
//! that relates configuration changes to match performance.
//!
//! This library provides:
//! - Domain types for configurations, matches and linked accounts
//! - Database storage layer with SQLite
//! - Analytics: configuration periods, aggregate metrics, trends, correlation
//! - OAuth account linking
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use sensilog_core::{AnalyticsService, Config, Database, DateRange};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let service = AnalyticsService::new(&db, config.analytics.clone());
//! let report = service
//!     .performance_analytics(&config.profile.user_id, &DateRange::default(), Utc::now())
//!     .expect("failed to compute analytics");
//! println!("{} configuration periods", report.settings_periods.len());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsService, ComparisonWindow, PerformanceMetrics, RecordStore};
pub use config::Config;
pub use db::{Database, ImportSummary};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod identity;
pub mod logging;
pub mod types;
