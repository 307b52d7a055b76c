use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use techinterview::app::{warm_up_currencies, Services};
use techinterview::cli::{Cli, Commands};
use techinterview::core::{init_logger, metrics, AppCaches, AppConfig};
use techinterview::storage::create_pool;
use techinterview::telegram::{create_bot, run_polling, setup_bot_commands};
use techinterview::web::start_web_server;

/// Main entry point
///
/// Parses CLI arguments and dispatches to the subcommand; `run` is the default.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = AppConfig::load()?;
    init_logger(&config.log_filter)?;

    match cli.command.unwrap_or(Commands::Run { webhook: false }) {
        Commands::Run { webhook } => run(config, webhook).await,
        Commands::ResetCurrencies => reset_currencies(config).await,
    }
}

/// Run the HTTP API and the Telegram bot
async fn run(mut config: AppConfig, use_webhook: bool) -> Result<()> {
    log::info!("Starting techinterview (webhook: {})", use_webhook);
    metrics::init_metrics();

    let pool = create_pool(&config.database_path)?;
    let services = Services::new(pool, &config, AppCaches::new())?;
    let shutdown = CancellationToken::new();

    warm_up_currencies(&services.currencies, &shutdown).await?;

    let bot = match config.telegram.bot_token {
        Some(_) => Some(create_bot(&config.telegram)?),
        None => {
            log::warn!("Telegram bot token is not set, the bot is disabled");
            None
        }
    };
    let bot_service = bot
        .as_ref()
        .map(|bot| Arc::new(services.bot_service(Arc::new(bot.clone()))));

    let webhook_secret = config.telegram.webhook_secret.take();
    let secret_token = webhook_secret
        .as_ref()
        .map(|secret| secret.expose_secret().to_string());
    let state = services.app_state(bot_service.clone(), webhook_secret, shutdown.clone());
    let server = tokio::spawn(start_web_server(config.http_port, state));

    match (bot, bot_service) {
        (Some(bot), Some(service)) => {
            if let Err(e) = setup_bot_commands(&bot).await {
                log::warn!("Failed to set bot commands: {}", e);
            }

            if use_webhook {
                let url = config
                    .telegram
                    .webhook_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("Webhook mode requires telegram.webhook_url"))?;
                log::info!("Starting bot in webhook mode at {}", url);

                let mut request = bot.set_webhook(url::Url::parse(url)?);
                if let Some(secret) = secret_token {
                    request = request.secret_token(secret);
                }
                request.await?;
                log::info!("Webhook set successfully");

                signal::ctrl_c().await?;
                log::info!("Shutting down gracefully...");
                bot.delete_webhook().await?;
            } else {
                // Polling and a registered webhook are mutually exclusive
                bot.delete_webhook().await?;
                run_polling(bot, service, shutdown.clone()).await;
            }
        }
        _ => {
            signal::ctrl_c().await?;
            log::info!("Shutting down gracefully...");
        }
    }

    shutdown.cancel();
    server.await??;
    Ok(())
}

/// Force a currency refresh and print the rates
async fn reset_currencies(config: AppConfig) -> Result<()> {
    config.currencies_url()?;

    let pool = create_pool(&config.database_path)?;
    let services = Services::new(pool, &config, AppCaches::new())?;
    let rates = services.currencies.reset_cache(&CancellationToken::new()).await?;

    for rate in rates.iter() {
        println!("{:<4} {:>12.4}  {}", rate.currency.to_string(), rate.value, rate.pub_date.format("%Y-%m-%d"));
    }
    Ok(())
}
