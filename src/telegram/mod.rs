//! Telegram bot: update model, command parsing, reply composition and routing

pub mod bot;
pub mod dispatcher;
pub mod parameters;
pub mod reply;
pub mod schema;
pub mod update;
pub mod usage;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, BotIdentity, BotTransport, InlineArticle};
pub use dispatcher::{TelegramBotService, UpdateOutcome};
pub use parameters::{ReplyLocale, TelegramBotUserCommandParameters};
pub use reply::{TelegramBotReplyData, TelegramReplyComposer};
pub use schema::{run_polling, schema};
pub use update::BotUpdate;
