use axum::extract::{FromRequest, FromRequestParts, Json, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::domain::PageRequest;
use crate::salaries::criteria::single_value;

/// Decoded query string in request order, repeated keys kept.
#[derive(Debug, Clone, Default)]
pub struct QueryPairs(pub Vec<(String, String)>);

impl<S> FromRequestParts<S> for QueryPairs
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = parts
            .uri
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(QueryPairs(pairs))
    }
}

impl QueryPairs {
    /// `page` and `pageSize`, defaulting to the first page of the default size.
    pub fn page_request(&self) -> AppResult<PageRequest> {
        let page = parse_number(&self.0, "page")?.unwrap_or(1);
        let page_size = parse_number(&self.0, "pageSize")?.unwrap_or(config::pagination::DEFAULT_PAGE_SIZE);
        PageRequest::new(page, page_size)
    }
}

fn parse_number(pairs: &[(String, String)], key: &str) -> AppResult<Option<u32>> {
    single_value(pairs, key)?
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| AppError::Validation(format!("Invalid value '{}' for '{}'", raw, key)))
        })
        .transpose()
}

/// JSON body whose rejections surface as 400 validation errors.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}
