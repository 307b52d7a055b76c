//! HTTP API: salary charts and lists, admin mutations, the Telegram webhook,
//! health and Prometheus metrics.

pub mod auth;
pub mod extract;
pub mod salaries;
pub mod telegram;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use secrecy::SecretString;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::core::error::AppResult;
use crate::core::metrics;
use crate::salaries::{ProfessionsProvider, SalariesService};
use crate::telegram::TelegramBotService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub salaries: SalariesService,
    pub professions: ProfessionsProvider,
    /// `None` when no bot token is configured
    pub bot: Option<Arc<TelegramBotService>>,
    pub webhook_secret: Option<Arc<SecretString>>,
    /// Cancelled on shutdown; request work runs under child tokens
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/salaries", get(salaries::list).post(salaries::create))
        .route("/api/salaries/chart", get(salaries::chart))
        .route("/api/salaries/historical-chart", get(salaries::historical_chart))
        .route("/api/salaries/all", get(salaries::all))
        .route("/api/salaries/not-in-stats", get(salaries::not_in_stats))
        .route("/api/salaries/select-box-items", get(salaries::select_box_items))
        .route("/api/salaries/survey-reply", post(salaries::survey_reply))
        .route(
            "/api/salaries/{id}",
            post(salaries::update).delete(salaries::delete),
        )
        .route("/api/salaries/{id}/approve", post(salaries::approve))
        .route(
            "/api/salaries/{id}/exclude-from-stats",
            post(salaries::exclude_from_stats),
        )
        .route("/api/telegram-bot/webhook", post(telegram::webhook))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Start the web server and serve until `shutdown` is cancelled.
pub async fn start_web_server(port: u16, state: AppState) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let shutdown = state.shutdown.clone();
    let app = router(state);

    log::info!("Starting web server on http://{}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    log::info!("Web server stopped");
    Ok(())
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /metrics
async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
