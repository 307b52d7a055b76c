//! Long-polling entry point

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio_util::sync::CancellationToken;

use crate::telegram::dispatcher::TelegramBotService;
use crate::telegram::update::BotUpdate;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Creates the dispatcher schema for the Telegram bot.
///
/// Every update goes to [`TelegramBotService::handle_update`]; the webhook
/// route calls the same method, so both modes behave identically.
pub fn schema(service: Arc<TelegramBotService>, shutdown: CancellationToken) -> UpdateHandler<HandlerError> {
    dptree::entry().endpoint(move |update: Update| {
        let service = Arc::clone(&service);
        let cancel = shutdown.child_token();
        async move {
            service.handle_update(BotUpdate::from(&update), &cancel).await;
            Ok(())
        }
    })
}

/// Runs long polling until Ctrl+C.
pub async fn run_polling(bot: Bot, service: Arc<TelegramBotService>, shutdown: CancellationToken) {
    log::info!("Starting bot in long polling mode");
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, schema(service, shutdown))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
}
