//! Update routing for the salaries bot.
//!
//! Every update lands in exactly one branch, checked in order:
//! inline query, no message, `/start` in a private chat, a message the bot
//! should answer (private chat or a group message whose first entity
//! mentions the bot), anything else.

use std::sync::Arc;

use chrono::Utc;
use strum::IntoStaticStr;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::cache::TtlCache;
use crate::core::config;
use crate::core::error::AppResult;
use crate::core::metrics;
use crate::domain::NewTelegramBotUsage;
use crate::salaries::professions::ProfessionsProvider;
use crate::storage::TelegramBotUsageRepository;
use crate::telegram::bot::{BotIdentity, BotTransport, InlineArticle};
use crate::telegram::parameters::{ReplyLocale, TelegramBotUserCommandParameters};
use crate::telegram::reply::{describe_filters, TelegramReplyComposer};
use crate::telegram::update::{BotUpdate, ChatType, IncomingMessage, InlineQueryUpdate};
use crate::telegram::usage;

/// Which branch an update took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum UpdateOutcome {
    InlineQueryAnswered,
    StartReplied,
    Replied,
    Ignored,
}

/// Dependencies of the bot pipeline.
#[derive(Clone)]
pub struct TelegramBotService {
    transport: Arc<dyn BotTransport>,
    composer: TelegramReplyComposer,
    professions: ProfessionsProvider,
    usages: Arc<dyn TelegramBotUsageRepository>,
    identity_cache: TtlCache<Arc<BotIdentity>>,
}

impl TelegramBotService {
    pub fn new(
        transport: Arc<dyn BotTransport>,
        composer: TelegramReplyComposer,
        professions: ProfessionsProvider,
        usages: Arc<dyn TelegramBotUsageRepository>,
        identity_cache: TtlCache<Arc<BotIdentity>>,
    ) -> Self {
        Self {
            transport,
            composer,
            professions,
            usages,
            identity_cache,
        }
    }

    /// Processes one update and counts the outcome. Errors are logged and
    /// swallowed; the caller has nobody to report them to.
    pub async fn handle_update(&self, update: BotUpdate, cancel: &CancellationToken) -> Option<UpdateOutcome> {
        match self.process_update(update, cancel).await {
            Ok(outcome) => {
                let label: &'static str = outcome.into();
                metrics::BOT_UPDATES_TOTAL.with_label_values(&[label]).inc();
                Some(outcome)
            }
            Err(e) => {
                metrics::BOT_UPDATES_TOTAL.with_label_values(&["failed"]).inc();
                log::error!("Failed to process Telegram update: {}", e);
                None
            }
        }
    }

    pub async fn process_update(&self, update: BotUpdate, cancel: &CancellationToken) -> AppResult<UpdateOutcome> {
        let message = match update {
            BotUpdate::InlineQuery(query) => {
                self.answer_inline_query(&query, cancel).await?;
                return Ok(UpdateOutcome::InlineQueryAnswered);
            }
            BotUpdate::Other => return Ok(UpdateOutcome::Ignored),
            BotUpdate::Message(message) => message,
        };

        let Some(text) = message.text.as_deref() else {
            return Ok(UpdateOutcome::Ignored);
        };
        let language_code = message.from.as_ref().and_then(|user| user.language_code.as_deref());

        if message.is_private() && is_start_command(text) {
            let reply = self
                .composer
                .start_reply(ReplyLocale::from_language_code(language_code))?;
            self.transport
                .send_reply(message.chat.id, &reply, Some(message.id))
                .await?;
            return Ok(UpdateOutcome::StartReplied);
        }

        if !self.is_addressed_to_bot(&message, cancel).await? {
            return Ok(UpdateOutcome::Ignored);
        }

        let professions = self.professions.professions(cancel).await?;
        let params = TelegramBotUserCommandParameters::parse(text, &professions, language_code);
        log::debug!(
            "Bot message in chat {} parsed as {}",
            message.chat.id,
            params.key_postfix()
        );

        let reply = self.composer.compose_cached(&params, cancel, Utc::now()).await?;
        let reply_to = message.reply_to_message_id.unwrap_or(message.id);
        self.transport
            .send_reply(message.chat.id, &reply, Some(reply_to))
            .await?;

        if let Some(event) = usage::from_message(&message) {
            self.record_usage(&event).await;
        }

        Ok(UpdateOutcome::Replied)
    }

    /// Bot username, asked from Telegram at most once per cache TTL.
    pub async fn bot_identity(&self, cancel: &CancellationToken) -> AppResult<Arc<BotIdentity>> {
        let transport = Arc::clone(&self.transport);
        self.identity_cache
            .get_or_try_populate(&config::cache::bot_identity_key(), cancel, async move {
                let identity = transport.bot_identity().await?;
                log::info!("Bot identity resolved: @{}", identity.username.as_deref().unwrap_or("?"));
                Ok(Arc::new(identity))
            })
            .await
    }

    async fn is_addressed_to_bot(&self, message: &IncomingMessage, cancel: &CancellationToken) -> AppResult<bool> {
        match message.chat.chat_type {
            ChatType::Private => Ok(true),
            ChatType::Group | ChatType::Supergroup => {
                if message.first_mention.is_none() {
                    return Ok(false);
                }
                let identity = self.bot_identity(cancel).await?;
                Ok(identity
                    .username
                    .as_deref()
                    .is_some_and(|username| message.mentions_first(username)))
            }
            ChatType::Channel => Ok(false),
        }
    }

    async fn answer_inline_query(&self, query: &InlineQueryUpdate, cancel: &CancellationToken) -> AppResult<()> {
        let professions = self.professions.professions(cancel).await?;
        let params = TelegramBotUserCommandParameters::parse(
            &query.query,
            &professions,
            query.from.language_code.as_deref(),
        );
        let reply = self.composer.compose_cached(&params, cancel, Utc::now()).await?;

        let title = match params.locale {
            ReplyLocale::Ru => "Статистика зарплат",
            ReplyLocale::En => "Salary statistics",
        };
        let article = InlineArticle {
            id: Uuid::new_v4().simple().to_string(),
            title: title.to_string(),
            description: describe_filters(&params),
            reply: reply.as_ref().clone(),
        };
        self.transport.answer_inline(&query.id, vec![article]).await?;

        self.record_usage(&usage::from_inline_query(query)).await;
        Ok(())
    }

    async fn record_usage(&self, event: &NewTelegramBotUsage) {
        if let Err(e) = self.usages.record_usage(event, Utc::now()).await {
            log::warn!("Failed to record bot usage for {}: {}", event.username, e);
        }
    }
}

/// `/start`, optionally addressed as `/start@bot`, followed by anything.
pub fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|command| command.split('@').next().unwrap_or_default())
        .is_some_and(|command| command.eq_ignore_ascii_case("/start"))
}
