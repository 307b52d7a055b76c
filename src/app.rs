//! Service wiring shared by the binary and the integration tests.

use std::sync::Arc;

use reqwest::Client;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::core::cache::AppCaches;
use crate::core::config::{self, AppConfig, APPLICATION_NAME};
use crate::core::error::AppResult;
use crate::salaries::{CurrencyService, ProfessionsProvider, SalariesService};
use crate::storage::{
    DbPool, SqliteLabelRepository, SqliteSalaryRepository, SqliteTelegramBotUsageRepository,
    TelegramBotUsageRepository,
};
use crate::telegram::{BotTransport, TelegramBotService, TelegramReplyComposer};
use crate::web::AppState;

/// Long-lived services built once at startup.
#[derive(Clone)]
pub struct Services {
    pub caches: AppCaches,
    pub salaries: SalariesService,
    pub professions: ProfessionsProvider,
    pub currencies: CurrencyService,
    pub usages: Arc<dyn TelegramBotUsageRepository>,
    pub frontend_base_url: String,
}

impl Services {
    pub fn new(pool: DbPool, config: &AppConfig, caches: AppCaches) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config::network::timeout())
            .user_agent(APPLICATION_NAME)
            .build()?;

        Ok(Self {
            salaries: SalariesService::new(Arc::new(SqliteSalaryRepository::new(pool.clone()))),
            professions: ProfessionsProvider::new(
                Arc::new(SqliteLabelRepository::new(pool.clone())),
                caches.professions.clone(),
            ),
            currencies: CurrencyService::new(client, config.currencies.url.clone(), caches.currencies.clone()),
            usages: Arc::new(SqliteTelegramBotUsageRepository::new(pool)),
            frontend_base_url: config.frontend_base_url.clone(),
            caches,
        })
    }

    pub fn reply_composer(&self) -> TelegramReplyComposer {
        TelegramReplyComposer::new(
            self.salaries.clone(),
            self.currencies.clone(),
            self.caches.bot_replies.clone(),
            self.frontend_base_url.clone(),
        )
    }

    pub fn bot_service(&self, transport: Arc<dyn BotTransport>) -> TelegramBotService {
        TelegramBotService::new(
            transport,
            self.reply_composer(),
            self.professions.clone(),
            Arc::clone(&self.usages),
            self.caches.bot_identity.clone(),
        )
    }

    pub fn app_state(
        &self,
        bot: Option<Arc<TelegramBotService>>,
        webhook_secret: Option<SecretString>,
        shutdown: CancellationToken,
    ) -> AppState {
        AppState {
            salaries: self.salaries.clone(),
            professions: self.professions.clone(),
            bot,
            webhook_secret: webhook_secret.map(Arc::new),
            shutdown,
        }
    }
}

/// Fills the currency cache before serving.
///
/// A missing feed URL stops startup; any other failure is logged and the
/// cache is populated on first use instead.
pub async fn warm_up_currencies(currencies: &CurrencyService, cancel: &CancellationToken) -> AppResult<()> {
    match currencies.get_all_rates(cancel).await {
        Ok(rates) => {
            log::info!("Currency cache warmed up with {} rates", rates.len());
            Ok(())
        }
        Err(e) if e.is_configuration() => Err(e),
        Err(e) => {
            log::warn!("Currency warm-up failed, continuing: {}", e);
            Ok(())
        }
    }
}
