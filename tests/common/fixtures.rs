#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use rusqlite::params;
use uuid::Uuid;

use techinterview::app::Services;
use techinterview::core::{AppCaches, AppConfig};
use techinterview::domain::{DateQuarter, DeveloperGrade, KazakhstanCity, SalaryRecord};
use techinterview::storage::{create_in_memory_pool, get_connection, DbPool, SalaryRepository, SqliteSalaryRepository};
use techinterview::telegram::update::{BotChat, BotUpdate, BotUser, ChatType, IncomingMessage};
use techinterview::telegram::TelegramBotService;

use super::transport::RecordingTransport;

/// In-memory database plus every service wired the way the binary wires them.
pub struct TestEnvironment {
    pub pool: DbPool,
    pub services: Services,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        let services = Services::new(pool.clone(), &config, AppCaches::new()).expect("Failed to build services");
        Self { pool, services }
    }

    pub fn salary_repo(&self) -> SqliteSalaryRepository {
        SqliteSalaryRepository::new(self.pool.clone())
    }

    pub async fn insert_all(&self, records: &[SalaryRecord]) {
        let repo = self.salary_repo();
        for record in records {
            repo.insert(record).await.expect("Failed to insert salary");
        }
    }

    pub fn bot(&self, transport: Arc<RecordingTransport>) -> TelegramBotService {
        self.services.bot_service(transport)
    }

    /// Stored usage counter for a user, summed over chats and usage types.
    pub fn usage_count(&self, username: &str) -> i64 {
        let conn = get_connection(&self.pool).expect("Failed to get connection");
        conn.query_row(
            "SELECT COALESCE(SUM(usage_count), 0) FROM telegram_bot_usages WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .expect("Failed to count usages")
    }
}

/// A KZT salary counted in stats, created `days_ago` days before now.
pub fn salary(grade: DeveloperGrade, city: KazakhstanCity, value: f64, days_ago: i64) -> SalaryRecord {
    let created_at = Utc::now() - Duration::days(days_ago);
    let quarter = DateQuarter::from_date(created_at);

    SalaryRecord {
        id: Uuid::new_v4(),
        value,
        quarter: quarter.quarter,
        year: quarter.year,
        grade: Some(grade),
        city: Some(city),
        profession_id: Some(1),
        use_in_stats: true,
        created_at,
        ..SalaryRecord::default()
    }
}

fn user(id: u64, username: &str) -> BotUser {
    BotUser {
        id,
        username: Some(username.to_string()),
        first_name: "Test".to_string(),
        last_name: None,
        language_code: None,
    }
}

pub fn private_message(id: i32, username: &str, text: &str) -> BotUpdate {
    BotUpdate::Message(IncomingMessage {
        id,
        chat: BotChat {
            id: 500,
            chat_type: ChatType::Private,
            title: None,
            username: Some(username.to_string()),
        },
        from: Some(user(500, username)),
        text: Some(text.to_string()),
        first_mention: None,
        reply_to_message_id: None,
    })
}

/// Group message; `first_mention` is the text of the leading mention entity.
pub fn group_message(id: i32, username: &str, text: &str, first_mention: Option<&str>) -> BotUpdate {
    BotUpdate::Message(IncomingMessage {
        id,
        chat: BotChat {
            id: -100,
            chat_type: ChatType::Group,
            title: Some("Rust KZ".to_string()),
            username: None,
        },
        from: Some(user(7, username)),
        text: Some(text.to_string()),
        first_mention: first_mention.map(str::to_string),
        reply_to_message_id: None,
    })
}
