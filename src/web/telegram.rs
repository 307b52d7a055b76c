//! Telegram webhook route

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use secrecy::ExposeSecret;
use serde_json::json;
use teloxide::types::Update;

use crate::telegram::update::BotUpdate;
use crate::web::AppState;

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// POST /api/telegram-bot/webhook
///
/// Answers 200 for every accepted update, including ones that fail to parse
/// or to process, so Telegram does not redeliver them.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let received = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if received != Some(expected.expose_secret()) {
            log::warn!("Rejected webhook call with a missing or wrong secret token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid secret token"})),
            )
                .into_response();
        }
    }

    let Some(bot) = state.bot.as_ref() else {
        log::warn!("Webhook update received while the bot is disabled");
        return StatusCode::OK.into_response();
    };

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            let cancel = state.shutdown.child_token();
            bot.handle_update(BotUpdate::from(&update), &cancel).await;
        }
        Err(e) => log::warn!("Ignoring unparsable webhook update: {}", e),
    }

    StatusCode::OK.into_response()
}
