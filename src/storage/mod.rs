//! SQLite pool, schema migrations and the repositories built on them.

pub mod bot_usages;
pub mod db;
pub mod labels;
pub mod migrations;
pub mod salaries;

// Re-exports for convenience
pub use bot_usages::{SqliteTelegramBotUsageRepository, TelegramBotUsageRepository};
pub use db::{create_in_memory_pool, create_pool, get_connection, DbConnection, DbPool};
pub use labels::{LabelKind, LabelRepository, SqliteLabelRepository};
pub use salaries::{SalaryRepository, SqliteSalaryRepository};
