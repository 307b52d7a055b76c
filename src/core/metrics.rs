//! Prometheus metrics for the salaries backend
//!
//! Counters are registered in the default registry on first use and exported
//! by `GET /metrics`.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

/// Bot updates by outcome
/// Labels: outcome (inline_query_answered/start_replied/replied/ignored/failed)
pub static BOT_UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "techinterview_bot_updates_total",
        "Telegram updates processed, by outcome",
        &["outcome"]
    )
    .expect("bot updates counter registers once")
});

/// Cache populations (misses that ran the loader)
/// Labels: cache (currencies/bot_replies/bot_identity/professions)
pub static CACHE_POPULATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "techinterview_cache_populations_total",
        "Cache misses that triggered a population",
        &["cache"]
    )
    .expect("cache populations counter registers once")
});

/// Chart responses by variant
/// Labels: variant (full/require_own_salary/historical)
pub static CHART_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "techinterview_chart_requests_total",
        "Salary chart responses, by variant",
        &["variant"]
    )
    .expect("chart requests counter registers once")
});

/// Forces registration so every series shows up before its first increment.
pub fn init_metrics() {
    Lazy::force(&BOT_UPDATES_TOTAL);
    Lazy::force(&CACHE_POPULATIONS_TOTAL);
    Lazy::force(&CHART_REQUESTS_TOTAL);
    log::info!("Metrics registry initialized");
}

/// Renders the default registry in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        log::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_registered_series() {
        init_metrics();
        BOT_UPDATES_TOTAL.with_label_values(&["ignored"]).inc();

        let text = render();
        assert!(text.contains("techinterview_bot_updates_total"));
    }
}
