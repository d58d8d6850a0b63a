//! Database layer for sensilog
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository operations for configurations, matches and linked accounts
//! - The [`RecordStore`](crate::analytics::RecordStore) view used by analytics

pub mod repo;
pub mod schema;

pub use repo::{Database, ImportSummary};
