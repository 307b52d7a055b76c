//! techinterview salaries backend
//!
//! Salary charts over anonymous survey submissions, served over HTTP and
//! through a Telegram bot.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, metrics and the TTL caches
//! - `domain`: salary records, enums and projections
//! - `storage`: SQLite pool, migrations and repositories
//! - `salaries`: filter chain, chart aggregation, currency rates, services
//! - `telegram`: bot update routing, command parsing and replies
//! - `web`: axum router and handlers

#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod cli;
pub mod core;
pub mod domain;
pub mod salaries;
pub mod storage;
pub mod telegram;
pub mod web;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
