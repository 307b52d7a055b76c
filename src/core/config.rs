use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, AppResult};

/// Name of the optional TOML file merged over the built-in defaults
pub const CONFIG_FILE: &str = "techinterview.toml";

/// Prefix for environment overrides, e.g. `TECHINTERVIEW_CURRENCIES__URL`
pub const ENV_PREFIX: &str = "TECHINTERVIEW_";

/// Application name reported in bot replies and chart links
pub const APPLICATION_NAME: &str = "techinterview.space/salaries";

/// Runtime configuration.
///
/// Layered by [`AppConfig::load`]: built-in defaults, then `techinterview.toml`
/// when present, then `TECHINTERVIEW_*` environment variables.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Public site used to build chart links in bot replies
    #[serde(default = "default_frontend_url")]
    pub frontend_base_url: String,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub currencies: CurrenciesConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrenciesConfig {
    /// Exchange-rate feed; rates cannot be populated without it
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token. The bot is disabled when unset.
    pub bot_token: Option<SecretString>,
    /// Custom Bot API server
    pub api_url: Option<String>,
    /// Public URL Telegram posts updates to in webhook mode
    pub webhook_url: Option<String>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value
    pub webhook_secret: Option<SecretString>,
}

#[derive(Serialize)]
struct Defaults {
    database_path: String,
    http_port: u16,
    frontend_base_url: String,
    log_filter: String,
}

fn default_database_path() -> String {
    "techinterview.sqlite".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_frontend_url() -> String {
    "https://techinterview.space".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            http_port: default_http_port(),
            frontend_base_url: default_frontend_url(),
            log_filter: default_log_filter(),
            currencies: CurrenciesConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default file and the process environment.
    pub fn load() -> AppResult<Self> {
        Self::from_figment(Self::figment(Path::new(CONFIG_FILE)))
    }

    /// Provider chain used by [`AppConfig::load`], exposed so callers can
    /// merge extra layers.
    pub fn figment(file: &Path) -> Figment {
        let defaults = Defaults {
            database_path: default_database_path(),
            http_port: default_http_port(),
            frontend_base_url: default_frontend_url(),
            log_filter: default_log_filter(),
        };

        Figment::from(Serialized::defaults(defaults))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> AppResult<Self> {
        figment
            .extract()
            .map_err(|e| AppError::Configuration(format!("Failed to load configuration: {}", e)))
    }

    /// Feed URL for the currency provider.
    ///
    /// # Errors
    /// Returns [`AppError::Configuration`] when the setting is absent or blank.
    pub fn currencies_url(&self) -> AppResult<&str> {
        match self.currencies.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(AppError::Configuration("Currencies:Url is not set".to_string())),
        }
    }
}

/// Process-wide cache settings
pub mod cache {
    use super::Duration;

    /// All currency rates from the feed
    pub const CURRENCIES_KEY: &str = "CurrencyService__AllCurrencies";
    pub const CURRENCIES_TTL_SECS: u64 = 24 * 60 * 60;

    /// Prefix shared by every bot cache entry
    pub const BOT_REPLY_PREFIX: &str = "TelegramBotService_ReplyData";
    pub const BOT_REPLY_TTL_SECS: u64 = 20 * 60;

    pub const BOT_IDENTITY_TTL_SECS: u64 = 30 * 24 * 60 * 60;
    pub const PROFESSIONS_TTL_SECS: u64 = 120 * 60;

    /// Upper bound on distinct reply entries kept at once
    pub const BOT_REPLY_CAPACITY: u64 = 10_000;

    pub fn currencies_ttl() -> Duration {
        Duration::from_secs(CURRENCIES_TTL_SECS)
    }

    pub fn bot_reply_ttl() -> Duration {
        Duration::from_secs(BOT_REPLY_TTL_SECS)
    }

    pub fn bot_identity_ttl() -> Duration {
        Duration::from_secs(BOT_IDENTITY_TTL_SECS)
    }

    pub fn professions_ttl() -> Duration {
        Duration::from_secs(PROFESSIONS_TTL_SECS)
    }

    pub fn bot_identity_key() -> String {
        format!("{}_BotUserName", BOT_REPLY_PREFIX)
    }

    pub fn professions_key() -> String {
        format!("{}_AllProfessions", BOT_REPLY_PREFIX)
    }

    pub fn bot_reply_key(postfix: &str) -> String {
        format!("{}_{}", BOT_REPLY_PREFIX, postfix)
    }
}

/// Salary chart windows
pub mod salaries {
    /// Records older than this many months are left out of "recent" charts
    pub const RECENCY_WINDOW_MONTHS: u32 = 6;

    /// A survey reply counts as recent for this many months
    pub const SURVEY_REPLY_WINDOW_MONTHS: u32 = 6;
}

/// Pagination limits for list endpoints
pub mod pagination {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for outbound HTTP requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file_or_env() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = AppConfig::from_figment(AppConfig::figment(Path::new(CONFIG_FILE))).map_err(|e| e.to_string())?;
            assert_eq!(config.http_port, 8080);
            assert_eq!(config.database_path, "techinterview.sqlite");
            assert!(config.currencies.url.is_none());
            assert!(config.currencies_url().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                http_port = 9000
                [currencies]
                url = "https://file.example/rates.xml"
                "#,
            )?;
            jail.set_env("TECHINTERVIEW_CURRENCIES__URL", "https://env.example/rates.xml");

            let config = AppConfig::from_figment(AppConfig::figment(Path::new(CONFIG_FILE))).map_err(|e| e.to_string())?;
            assert_eq!(config.http_port, 9000);
            assert_eq!(config.currencies_url().map_err(|e| e.to_string())?, "https://env.example/rates.xml");
            Ok(())
        });
    }

    #[test]
    fn test_blank_currencies_url_is_configuration_error() {
        let config = AppConfig {
            currencies: CurrenciesConfig { url: Some("  ".into()) },
            ..AppConfig::default()
        };
        assert!(matches!(config.currencies_url(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_cache_keys() {
        assert_eq!(cache::bot_identity_key(), "TelegramBotService_ReplyData_BotUserName");
        assert_eq!(cache::professions_key(), "TelegramBotService_ReplyData_AllProfessions");
        assert_eq!(cache::bot_reply_key("Middle_Almaty_"), "TelegramBotService_ReplyData_Middle_Almaty_");
    }
}
