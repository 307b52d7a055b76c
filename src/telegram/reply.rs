//! Bot reply composition.
//!
//! A reply is HTML text plus URL buttons. Composed replies are cached per
//! parameter key for twenty minutes, so identical questions from different
//! chats share one computation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indoc::formatdoc;
use itertools::Itertools;
use teloxide::utils::html;
use tokio_util::sync::CancellationToken;

use crate::core::cache::TtlCache;
use crate::core::config::{self, APPLICATION_NAME};
use crate::core::error::{AppError, AppResult};
use crate::domain::{Currency, DeveloperGrade, UserSalaryDto};
use crate::salaries::chart::{average, median};
use crate::salaries::currencies::{CurrencyRate, CurrencyService};
use crate::salaries::query::SalariesForChartQuery;
use crate::salaries::service::SalariesService;
use crate::telegram::parameters::{ReplyLocale, TelegramBotUserCommandParameters};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub text: String,
    pub url: String,
}

/// Composed reply: HTML text and an optional inline keyboard of links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramBotReplyData {
    pub reply_text: String,
    pub buttons: Vec<ReplyButton>,
}

/// Link to the salaries page with the same filters applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalariesChartPageLink(String);

impl SalariesChartPageLink {
    pub const UTM_SOURCE: &'static str = "telegram";
    pub const UTM_CAMPAIGN: &'static str = "telegram-bot-reply";

    /// # Errors
    /// [`AppError::Configuration`] when `base_url` is not an absolute URL.
    pub fn new(base_url: &str, params: Option<&TelegramBotUserCommandParameters>) -> AppResult<Self> {
        let page = format!("{}/salaries", base_url.trim_end_matches('/'));
        let mut url = url::Url::parse(&page)
            .map_err(|e| AppError::Configuration(format!("Invalid frontend base URL {}: {}", base_url, e)))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(params) = params {
                if let Some(grade) = params.grade {
                    query.append_pair("grade", &(grade as i64).to_string());
                }
                if !params.professions.is_empty() {
                    query.append_pair("profsInclude", &params.professions.iter().map(|p| p.id).join(","));
                }
                if !params.cities.is_empty() {
                    query.append_pair("cities", &params.cities.iter().map(|c| *c as i64).join(","));
                }
            }
            query.append_pair("utm_source", Self::UTM_SOURCE);
            query.append_pair("utm_campaign", Self::UTM_CAMPAIGN);
        }

        Ok(Self(url.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Builds (or fetches cached) replies for parsed bot commands.
#[derive(Clone)]
pub struct TelegramReplyComposer {
    salaries: SalariesService,
    currencies: CurrencyService,
    cache: TtlCache<Arc<TelegramBotReplyData>>,
    frontend_base_url: String,
}

impl TelegramReplyComposer {
    pub fn new(
        salaries: SalariesService,
        currencies: CurrencyService,
        cache: TtlCache<Arc<TelegramBotReplyData>>,
        frontend_base_url: impl Into<String>,
    ) -> Self {
        Self {
            salaries,
            currencies,
            cache,
            frontend_base_url: frontend_base_url.into(),
        }
    }

    /// Reply for `params`, computed at most once per key and TTL window.
    pub async fn compose_cached(
        &self,
        params: &TelegramBotUserCommandParameters,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> AppResult<Arc<TelegramBotReplyData>> {
        let key = config::cache::bot_reply_key(&params.key_postfix());
        self.cache
            .get_or_try_populate(&key, cancel, self.compose(params, cancel, now))
            .await
    }

    /// Static welcome message. Never cached, never touches the salaries.
    pub fn start_reply(&self, locale: ReplyLocale) -> AppResult<TelegramBotReplyData> {
        let link = SalariesChartPageLink::new(&self.frontend_base_url, None)?;
        let text = match locale {
            ReplyLocale::Ru => formatdoc! {"
                Привет! Я бот <b>{app}</b>.

                Напишите грейд, город или профессию, например <code>middle алматы</code> или <code>senior backend developer</code>, и я пришлю медианную и среднюю зарплату по анкетам за последние полгода.

                В группах упомяните меня первым словом: <code>@бот middle</code>.",
                app = APPLICATION_NAME,
            },
            ReplyLocale::En => formatdoc! {"
                Hi! I am the <b>{app}</b> bot.

                Send me a grade, a city or a profession, e.g. <code>middle almaty</code> or <code>senior backend developer</code>, and I will reply with the median and average salary from the last six months of submissions.

                In groups, mention me as the first word: <code>@bot middle</code>.",
                app = APPLICATION_NAME,
            },
        };

        Ok(TelegramBotReplyData {
            reply_text: text,
            buttons: vec![ReplyButton {
                text: open_site_label(locale).to_string(),
                url: link.as_str().to_string(),
            }],
        })
    }

    async fn compose(
        &self,
        params: &TelegramBotUserCommandParameters,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> AppResult<Arc<TelegramBotReplyData>> {
        let query = SalariesForChartQuery::new(&params.to_criteria(), now);
        let salaries = self.salaries.filtered_salaries(&query, cancel).await?;

        let rates = match self.currencies.get_all_rates(cancel).await {
            Ok(rates) => Some(rates),
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => {
                log::warn!("Composing bot reply without currency rates: {}", e);
                None
            }
        };

        let link = SalariesChartPageLink::new(&self.frontend_base_url, Some(params))?;
        Ok(Arc::new(build_reply(
            params,
            &salaries,
            rates.as_deref().map(Vec::as_slice),
            &link,
        )))
    }
}

/// Pure reply rendering over already filtered salaries.
///
/// Values are converted to KZT with `rates`; records in a currency without a
/// rate are skipped. Without rates only KZT records count and the USD
/// estimate is left out.
pub fn build_reply(
    params: &TelegramBotUserCommandParameters,
    salaries: &[UserSalaryDto],
    rates: Option<&[CurrencyRate]>,
    link: &SalariesChartPageLink,
) -> TelegramBotReplyData {
    let locale = params.locale;
    let in_kzt: Vec<(Option<DeveloperGrade>, f64)> = salaries
        .iter()
        .filter_map(|salary| to_kzt(salary, rates).map(|value| (salary.grade, value)))
        .collect();
    let usd_rate = rates
        .and_then(|rates| rates.iter().find(|rate| rate.currency == Currency::USD))
        .map(|rate| rate.value)
        .filter(|value| *value > 0.0);

    let mut lines = Vec::new();
    let title = match locale {
        ReplyLocale::Ru => "Зарплаты в IT",
        ReplyLocale::En => "IT salaries",
    };
    match describe_filters(params) {
        Some(filters) => lines.push(format!("<b>{}</b>: {}", title, html::escape(&filters))),
        None => lines.push(format!("<b>{}</b>", title)),
    }

    if in_kzt.is_empty() {
        lines.push(String::new());
        lines.push(
            match locale {
                ReplyLocale::Ru => "Пока нет анкет под эти фильтры. Попробуйте убрать город или профессию.",
                ReplyLocale::En => "No submissions match these filters yet. Try dropping the city or the profession.",
            }
            .to_string(),
        );
    } else {
        let grades: Vec<DeveloperGrade> = match params.grade {
            Some(grade) => vec![grade],
            None => DeveloperGrade::CHART_GRADES.to_vec(),
        };

        for grade in grades {
            let mut values: Vec<f64> = in_kzt
                .iter()
                .filter(|(g, _)| *g == Some(grade))
                .map(|(_, value)| *value)
                .collect();
            let (Some(avg), Some(med)) = (average(&values), median(&mut values)) else {
                continue;
            };

            lines.push(String::new());
            lines.push(format!("<b>{}</b> ({})", grade, values.len()));
            lines.push(format!(
                "{}: {}",
                median_label(locale),
                money_line(med, usd_rate)
            ));
            lines.push(format!(
                "{}: {}",
                average_label(locale),
                money_line(avg, usd_rate)
            ));
        }

        lines.push(String::new());
        lines.push(match locale {
            ReplyLocale::Ru => format!("Всего анкет: {}", in_kzt.len()),
            ReplyLocale::En => format!("Total submissions: {}", in_kzt.len()),
        });
    }

    TelegramBotReplyData {
        reply_text: lines.join("\n"),
        buttons: vec![ReplyButton {
            text: open_site_label(locale).to_string(),
            url: link.as_str().to_string(),
        }],
    }
}

/// Human-readable filter list, or `None` when nothing is filtered.
pub fn describe_filters(params: &TelegramBotUserCommandParameters) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(grade) = params.grade {
        parts.push(grade.to_string());
    }
    parts.extend(params.professions.iter().map(|p| p.title.clone()));
    parts.extend(params.cities.iter().map(|city| match params.locale {
        ReplyLocale::Ru => city.ru_name().to_string(),
        ReplyLocale::En => city.to_string(),
    }));

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Formats a whole amount with space-separated thousands: `1 250 000`.
pub fn format_money(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .join(" ");

    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn to_kzt(salary: &UserSalaryDto, rates: Option<&[CurrencyRate]>) -> Option<f64> {
    if salary.currency == Currency::KZT {
        return Some(salary.value);
    }
    rates?
        .iter()
        .find(|rate| rate.currency == salary.currency)
        .map(|rate| rate.to_kzt(salary.value))
}

fn money_line(kzt: f64, usd_rate: Option<f64>) -> String {
    match usd_rate {
        Some(rate) => format!(
            "{} {} (~{} {})",
            format_money(kzt),
            Currency::KZT.symbol(),
            format_money(kzt / rate),
            Currency::USD.symbol()
        ),
        None => format!("{} {}", format_money(kzt), Currency::KZT.symbol()),
    }
}

fn median_label(locale: ReplyLocale) -> &'static str {
    match locale {
        ReplyLocale::Ru => "Медиана",
        ReplyLocale::En => "Median",
    }
}

fn average_label(locale: ReplyLocale) -> &'static str {
    match locale {
        ReplyLocale::Ru => "Среднее",
        ReplyLocale::En => "Average",
    }
}

fn open_site_label(locale: ReplyLocale) -> &'static str {
    match locale {
        ReplyLocale::Ru => "Открыть на сайте",
        ReplyLocale::En => "Open on the website",
    }
}
