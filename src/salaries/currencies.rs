//! Exchange rates from the national bank RSS feed.
//!
//! The feed lists one `<item>` per currency with the KZT price of `quant`
//! units. Rates are cached for a day; the cache is only ever filled from a
//! complete, successful fetch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::cache::TtlCache;
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::domain::Currency;

/// KZT price of one unit of `currency`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub currency: Currency,
    pub value: f64,
    pub pub_date: DateTime<Utc>,
}

impl CurrencyRate {
    /// Converts `amount` of this currency to KZT.
    pub fn to_kzt(&self, amount: f64) -> f64 {
        amount * self.value
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: String,
    quant: Option<String>,
}

/// Parses the feed body, keeps the known currencies and guarantees a KZT
/// entry at the front.
///
/// # Errors
/// Returns [`AppError::Xml`] when the body is not a readable RSS document.
pub fn parse_feed(body: &str, now: DateTime<Utc>) -> AppResult<Vec<CurrencyRate>> {
    let rss: Rss = quick_xml::de::from_str(body)?;

    let first_pub_date = rss
        .channel
        .items
        .first()
        .and_then(|item| item.pub_date.as_deref())
        .and_then(parse_pub_date);

    let mut rates: Vec<CurrencyRate> = rss.channel.items.iter().filter_map(|item| parse_item(item, now)).collect();

    if !rates.iter().any(|rate| rate.currency == Currency::KZT) {
        rates.insert(
            0,
            CurrencyRate {
                currency: Currency::KZT,
                value: 1.0,
                pub_date: first_pub_date.unwrap_or(now),
            },
        );
    }

    Ok(rates)
}

fn parse_item(item: &FeedItem, now: DateTime<Utc>) -> Option<CurrencyRate> {
    let currency = item.title.trim().parse::<Currency>().ok()?;
    let price = item.description.trim().replace(',', ".").parse::<f64>().ok()?;
    let quant = match item.quant.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse::<f64>().ok()?,
        _ => 1.0,
    };
    if quant <= 0.0 || !price.is_finite() {
        log::debug!("Skipping currency item {} with price {} and quant {}", item.title, price, quant);
        return None;
    }

    Some(CurrencyRate {
        currency,
        value: price / quant,
        pub_date: item.pub_date.as_deref().and_then(parse_pub_date).unwrap_or(now),
    })
}

/// Feed dates look like `15.05.2024`.
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%d.%m.%Y")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Cached access to the exchange-rate feed.
#[derive(Clone)]
pub struct CurrencyService {
    client: Client,
    feed_url: Option<String>,
    cache: TtlCache<Arc<Vec<CurrencyRate>>>,
}

impl CurrencyService {
    pub fn new(client: Client, feed_url: Option<String>, cache: TtlCache<Arc<Vec<CurrencyRate>>>) -> Self {
        Self {
            client,
            feed_url,
            cache,
        }
    }

    /// Every known rate, fetching the feed on a cache miss.
    ///
    /// # Errors
    /// * [`AppError::Configuration`] when no feed URL is configured
    /// * network, status and XML errors from the fetch, none of which are cached
    pub async fn get_all_rates(&self, cancel: &CancellationToken) -> AppResult<Arc<Vec<CurrencyRate>>> {
        self.cache
            .get_or_try_populate(config::cache::CURRENCIES_KEY, cancel, self.fetch_rates())
            .await
    }

    /// Rates for the requested currencies, in feed order.
    pub async fn get_rates(
        &self,
        currencies: &HashSet<Currency>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<CurrencyRate>> {
        if currencies.is_empty() {
            return Ok(Vec::new());
        }

        let all = self.get_all_rates(cancel).await?;
        Ok(all
            .iter()
            .filter(|rate| currencies.contains(&rate.currency))
            .cloned()
            .collect())
    }

    pub async fn get_rate(&self, currency: Currency, cancel: &CancellationToken) -> AppResult<Option<CurrencyRate>> {
        let all = self.get_all_rates(cancel).await?;
        Ok(all.iter().find(|rate| rate.currency == currency).cloned())
    }

    /// Drops the cached rates and fetches them again.
    pub async fn reset_cache(&self, cancel: &CancellationToken) -> AppResult<Arc<Vec<CurrencyRate>>> {
        self.cache.invalidate(config::cache::CURRENCIES_KEY).await;
        log::info!("Currency cache reset");
        self.get_all_rates(cancel).await
    }

    async fn fetch_rates(&self) -> AppResult<Arc<Vec<CurrencyRate>>> {
        let url = match self.feed_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => return Err(AppError::Configuration("Currencies:Url is not set".to_string())),
        };

        log::info!("Fetching currency rates from {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let rates = parse_feed(&body, Utc::now())?;
        log::info!("Loaded {} currency rates", rates.len());

        Ok(Arc::new(rates))
    }
}
