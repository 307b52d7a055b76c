use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::core::error::AppResult;
use crate::domain::enums::from_stored;
use crate::domain::{NewTelegramBotUsage, TelegramBotUsage, TelegramBotUsageType};
use crate::storage::db::{get_connection, DbPool};

#[async_trait]
pub trait TelegramBotUsageRepository: Send + Sync {
    /// Counts one more use for the (username, channel, type) triple, creating
    /// the row on first sight. The last received text replaces the stored one.
    async fn record_usage(&self, usage: &NewTelegramBotUsage, now: DateTime<Utc>) -> AppResult<TelegramBotUsage>;
}

#[derive(Clone)]
pub struct SqliteTelegramBotUsageRepository {
    pool: DbPool,
}

impl SqliteTelegramBotUsageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelegramBotUsageRepository for SqliteTelegramBotUsageRepository {
    async fn record_usage(&self, usage: &NewTelegramBotUsage, now: DateTime<Utc>) -> AppResult<TelegramBotUsage> {
        let conn = get_connection(&self.pool)?;
        let stored = conn.query_row(
            "INSERT INTO telegram_bot_usages
                (username, channel_name, received_message_text, usage_type, usage_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
             ON CONFLICT(username, channel_name, usage_type) DO UPDATE SET
                usage_count = usage_count + 1,
                received_message_text = excluded.received_message_text,
                updated_at = excluded.updated_at
             RETURNING id, username, channel_name, received_message_text, usage_type, usage_count,
                created_at, updated_at",
            params![
                usage.username,
                usage.channel_name,
                usage.received_message_text,
                usage.usage_type as i64,
                now,
            ],
            |row| {
                Ok(TelegramBotUsage {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    channel_name: row.get(2)?,
                    received_message_text: row.get(3)?,
                    usage_type: from_stored("usage_type", row.get(4)?, TelegramBotUsageType::from_repr)?,
                    usage_count: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            },
        )?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::create_in_memory_pool;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn usage(usage_type: TelegramBotUsageType, text: &str) -> NewTelegramBotUsage {
        NewTelegramBotUsage {
            username: "alice".to_string(),
            channel_name: "alice".to_string(),
            received_message_text: Some(text.to_string()),
            usage_type,
        }
    }

    #[tokio::test]
    async fn test_repeated_usage_increments_counter() {
        let repo = SqliteTelegramBotUsageRepository::new(create_in_memory_pool().unwrap());
        let first_seen = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let later = first_seen + Duration::hours(2);

        let first = repo
            .record_usage(&usage(TelegramBotUsageType::DirectMessage, "middle"), first_seen)
            .await
            .unwrap();
        let second = repo
            .record_usage(&usage(TelegramBotUsageType::DirectMessage, "senior"), later)
            .await
            .unwrap();

        assert_eq!(first.usage_count, 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.usage_count, 2);
        assert_eq!(second.received_message_text.as_deref(), Some("senior"));
        assert_eq!(second.created_at, first_seen);
        assert_eq!(second.updated_at, later);
    }

    #[tokio::test]
    async fn test_usage_types_are_counted_separately() {
        let repo = SqliteTelegramBotUsageRepository::new(create_in_memory_pool().unwrap());
        let now = Utc::now();

        repo.record_usage(&usage(TelegramBotUsageType::DirectMessage, "a"), now)
            .await
            .unwrap();
        let inline = repo
            .record_usage(&usage(TelegramBotUsageType::InlineQuery, "a"), now)
            .await
            .unwrap();

        assert_eq!(inline.usage_count, 1);
        assert_eq!(inline.usage_type, TelegramBotUsageType::InlineQuery);
    }
}
