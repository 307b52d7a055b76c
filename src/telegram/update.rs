//! Transport-neutral view of a Telegram update.
//!
//! Only the fields the dispatcher reads are kept, so tests can build updates
//! without going through the Bot API JSON.

use teloxide::types::{Chat, MessageEntityKind, Update, UpdateKind, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotUpdate {
    InlineQuery(InlineQueryUpdate),
    Message(IncomingMessage),
    /// Anything the bot does not react to (edits, callbacks, member changes)
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotUser {
    pub id: u64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotChat {
    pub id: i64,
    pub chat_type: ChatType,
    pub title: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: i32,
    pub chat: BotChat,
    pub from: Option<BotUser>,
    pub text: Option<String>,
    /// Text of the first entity when that entity is an `@mention`
    pub first_mention: Option<String>,
    pub reply_to_message_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineQueryUpdate {
    pub id: String,
    pub query: String,
    pub from: BotUser,
}

impl IncomingMessage {
    pub fn is_private(&self) -> bool {
        self.chat.chat_type == ChatType::Private
    }

    /// True when the first entity mentions `username` (with or without the
    /// leading `@`), ignoring case.
    pub fn mentions_first(&self, username: &str) -> bool {
        let expected = username.trim_start_matches('@');
        self.first_mention
            .as_deref()
            .and_then(|mention| mention.strip_prefix('@'))
            .is_some_and(|mention| !expected.is_empty() && mention.eq_ignore_ascii_case(expected))
    }
}

impl From<&User> for BotUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            language_code: user.language_code.clone(),
        }
    }
}

impl From<&Chat> for BotChat {
    fn from(chat: &Chat) -> Self {
        let chat_type = if chat.is_private() {
            ChatType::Private
        } else if chat.is_supergroup() {
            ChatType::Supergroup
        } else if chat.is_group() {
            ChatType::Group
        } else {
            ChatType::Channel
        };

        Self {
            id: chat.id.0,
            chat_type,
            title: chat.title().map(str::to_string),
            username: chat.username().map(str::to_string),
        }
    }
}

impl From<&Update> for BotUpdate {
    fn from(update: &Update) -> Self {
        match &update.kind {
            UpdateKind::InlineQuery(query) => BotUpdate::InlineQuery(InlineQueryUpdate {
                id: query.id.0.clone(),
                query: query.query.clone(),
                from: BotUser::from(&query.from),
            }),
            UpdateKind::Message(message) => {
                let first_mention = message.parse_entities().and_then(|entities| {
                    entities
                        .first()
                        .filter(|entity| matches!(entity.kind(), MessageEntityKind::Mention))
                        .map(|entity| entity.text().to_string())
                });

                BotUpdate::Message(IncomingMessage {
                    id: message.id.0,
                    chat: BotChat::from(&message.chat),
                    from: message.from.as_ref().map(BotUser::from),
                    text: message.text().map(str::to_string),
                    first_mention,
                    reply_to_message_id: message.reply_to_message().map(|reply| reply.id.0),
                })
            }
            _ => BotUpdate::Other,
        }
    }
}
