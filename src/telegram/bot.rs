//! Bot construction and the outbound transport seam
//!
//! The dispatcher only talks to Telegram through [`BotTransport`], which is
//! implemented for `teloxide::Bot` and faked in tests.

use async_trait::async_trait;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryId, InlineQueryResult,
    InlineQueryResultArticle, InputMessageContent, InputMessageContentText, MessageId, ParseMode, ReplyParameters,
};

use crate::core::config::{self, TelegramConfig};
use crate::core::error::{AppError, AppResult};
use crate::telegram::reply::TelegramBotReplyData;

/// What the bot knows about itself. Cached for a month.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BotIdentity {
    pub username: Option<String>,
}

/// One result for an inline query answer.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub reply: TelegramBotReplyData,
}

#[async_trait]
pub trait BotTransport: Send + Sync {
    /// Asks Telegram who the bot is.
    async fn bot_identity(&self) -> AppResult<BotIdentity>;

    /// Sends `reply` as HTML, threaded under `reply_to` when given.
    async fn send_reply(&self, chat_id: i64, reply: &TelegramBotReplyData, reply_to: Option<i32>) -> AppResult<()>;

    async fn answer_inline(&self, query_id: &str, articles: Vec<InlineArticle>) -> AppResult<()>;
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(AppError::Configuration)` - No token configured or the API URL is invalid
pub fn create_bot(telegram: &TelegramConfig) -> AppResult<Bot> {
    let token = telegram
        .bot_token
        .as_ref()
        .map(|token| token.expose_secret().to_string())
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| AppError::Configuration("Telegram bot token is not set".to_string()))?;

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    match telegram.api_url.as_deref() {
        Some(api_url) => {
            log::info!("Using custom Bot API URL: {}", api_url);
            let url = url::Url::parse(api_url)
                .map_err(|e| AppError::Configuration(format!("Invalid Bot API URL: {}", e)))?;
            Ok(bot.set_api_url(url))
        }
        None => Ok(bot),
    }
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> AppResult<()> {
    bot.set_my_commands(vec![BotCommand::new(
        "start",
        "что умеет бот / what the bot can do",
    )])
    .await?;

    Ok(())
}

/// Inline keyboard with one URL button per row; buttons with malformed URLs
/// are left out.
pub fn reply_keyboard(reply: &TelegramBotReplyData) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = reply
        .buttons
        .iter()
        .filter_map(|button| match url::Url::parse(&button.url) {
            Ok(url) => Some(vec![InlineKeyboardButton::url(button.text.clone(), url)]),
            Err(e) => {
                log::warn!("Skipping reply button with invalid URL {}: {}", button.url, e);
                None
            }
        })
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

#[async_trait]
impl BotTransport for Bot {
    async fn bot_identity(&self) -> AppResult<BotIdentity> {
        let me = self.get_me().await?;
        Ok(BotIdentity {
            username: me.user.username.clone(),
        })
    }

    async fn send_reply(&self, chat_id: i64, reply: &TelegramBotReplyData, reply_to: Option<i32>) -> AppResult<()> {
        let mut request = self
            .send_message(ChatId(chat_id), reply.reply_text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
        }
        if let Some(keyboard) = reply_keyboard(reply) {
            request = request.reply_markup(keyboard);
        }

        request.await?;
        Ok(())
    }

    async fn answer_inline(&self, query_id: &str, articles: Vec<InlineArticle>) -> AppResult<()> {
        let results: Vec<InlineQueryResult> = articles
            .into_iter()
            .map(|article| {
                let content = InputMessageContent::Text(
                    InputMessageContentText::new(article.reply.reply_text.clone()).parse_mode(ParseMode::Html),
                );
                let mut result = InlineQueryResultArticle::new(article.id, article.title, content);
                if let Some(description) = article.description {
                    result = result.description(description);
                }
                if let Some(keyboard) = reply_keyboard(&article.reply) {
                    result = result.reply_markup(keyboard);
                }
                InlineQueryResult::Article(result)
            })
            .collect();

        self.answer_inline_query(InlineQueryId(query_id.to_string()), results)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::reply::ReplyButton;
    use secrecy::SecretString;

    #[test]
    fn test_create_bot_requires_token() {
        let err = create_bot(&TelegramConfig::default()).unwrap_err();
        assert!(err.is_configuration());

        let config = TelegramConfig {
            bot_token: Some(SecretString::from("123:abc")),
            api_url: Some("not a url".to_string()),
            ..TelegramConfig::default()
        };
        assert!(create_bot(&config).unwrap_err().is_configuration());
    }

    #[test]
    fn test_keyboard_skips_invalid_urls() {
        let reply = TelegramBotReplyData {
            reply_text: "text".to_string(),
            buttons: vec![
                ReplyButton {
                    text: "ok".to_string(),
                    url: "https://techinterview.space/salaries".to_string(),
                },
                ReplyButton {
                    text: "broken".to_string(),
                    url: "::".to_string(),
                },
            ],
        };

        let keyboard = reply_keyboard(&reply).unwrap();
        assert_eq!(keyboard.inline_keyboard.len(), 1);

        let empty = TelegramBotReplyData {
            reply_text: "text".to_string(),
            buttons: Vec::new(),
        };
        assert!(reply_keyboard(&empty).is_none());
    }
}
