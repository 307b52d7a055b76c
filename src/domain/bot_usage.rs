use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, FromRepr};

/// How the bot was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, FromRepr, Serialize)]
#[repr(i64)]
pub enum TelegramBotUsageType {
    #[default]
    Undefined = 0,
    DirectMessage = 1,
    GroupMention = 2,
    SupergroupMention = 3,
    InlineQuery = 4,
}

/// One row per (username, channel, usage type). The counter grows with every
/// accepted message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramBotUsage {
    pub id: i64,
    pub username: String,
    pub channel_name: String,
    pub received_message_text: Option<String>,
    pub usage_type: TelegramBotUsageType,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Usage observed on an incoming update, before it is counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTelegramBotUsage {
    pub username: String,
    pub channel_name: String,
    pub received_message_text: Option<String>,
    pub usage_type: TelegramBotUsageType,
}
