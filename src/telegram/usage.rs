use crate::domain::{NewTelegramBotUsage, TelegramBotUsageType};
use crate::telegram::update::{BotChat, BotUser, ChatType, IncomingMessage, InlineQueryUpdate};

/// Usage type by the kind of chat the message came from.
pub fn classify(chat_type: ChatType) -> TelegramBotUsageType {
    match chat_type {
        ChatType::Private => TelegramBotUsageType::DirectMessage,
        ChatType::Group => TelegramBotUsageType::GroupMention,
        ChatType::Supergroup => TelegramBotUsageType::SupergroupMention,
        ChatType::Channel => TelegramBotUsageType::Undefined,
    }
}

/// Telegram username when set, otherwise the trimmed display name.
pub fn display_username(user: &BotUser) -> String {
    match user.username.as_deref() {
        Some(username) if !username.is_empty() => username.to_string(),
        _ => format!("{} {}", user.first_name, user.last_name.as_deref().unwrap_or_default())
            .trim()
            .to_string(),
    }
}

fn channel_name(chat: &BotChat) -> String {
    chat.title
        .clone()
        .or_else(|| chat.username.clone())
        .unwrap_or_else(|| chat.id.to_string())
}

/// Telemetry event for an accepted message; `None` when the sender is unknown.
pub fn from_message(message: &IncomingMessage) -> Option<NewTelegramBotUsage> {
    let from = message.from.as_ref()?;
    Some(NewTelegramBotUsage {
        username: display_username(from),
        channel_name: channel_name(&message.chat),
        received_message_text: message.text.clone(),
        usage_type: classify(message.chat.chat_type),
    })
}

pub fn from_inline_query(query: &InlineQueryUpdate) -> NewTelegramBotUsage {
    let username = display_username(&query.from);
    NewTelegramBotUsage {
        channel_name: username.clone(),
        username,
        received_message_text: Some(query.query.clone()),
        usage_type: TelegramBotUsageType::InlineQuery,
    }
}
