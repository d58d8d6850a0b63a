//! Formatting helpers for text reports.

use chrono::{DateTime, Utc};

use crate::analytics::Correlation;

/// Format a relative change (e.g., "+23.0%"), or "n/a" when not computable.
pub fn format_change_percent(change: Option<f64>) -> String {
    match change {
        Some(value) => format!("{:+.1}%", value),
        None => "n/a".to_string(),
    }
}

/// Format an absolute percentage-point delta (e.g., "-4.5 pts").
pub fn format_points(delta: f64) -> String {
    format!("{:+.1} pts", delta)
}

/// Format a correlation coefficient, or "insufficient data".
pub fn format_correlation(correlation: Correlation) -> String {
    match correlation {
        Correlation::Value(r) => format!("{:+.3}", r),
        Correlation::InsufficientData => "insufficient data".to_string(),
    }
}

/// Format a timestamp for tables (e.g., "2024-03-01 18:00").
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Format an optional value, or "-" if missing.
pub fn format_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}
