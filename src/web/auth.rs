//! Caller identity from gateway headers
//!
//! The upstream gateway authenticates requests and forwards the result as
//! `X-User-Id` and `X-User-Role`. Nothing here verifies credentials.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::core::error::AppError;
use crate::domain::{CurrentUser, Role};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Identity when the gateway sent one.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<CurrentUser>);

/// Identity on routes that need one; 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub CurrentUser);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, AppError> {
    parts
        .headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| AppError::Unauthorized(format!("Malformed {} header", name)))
        })
        .transpose()
}

fn user_from_parts(parts: &Parts) -> Result<Option<CurrentUser>, AppError> {
    let Some(raw_id) = header(parts, USER_ID_HEADER)?.filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized(format!("Malformed {} header", USER_ID_HEADER)))?;

    let role = match header(parts, USER_ROLE_HEADER)? {
        Some(raw) if !raw.is_empty() => raw
            .parse::<Role>()
            .map_err(|_| AppError::Unauthorized(format!("Unknown role '{}'", raw)))?,
        _ => Role::Member,
    };

    Ok(Some(CurrentUser::new(id, role)))
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_from_parts(parts)?))
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts)?
            .map(RequireUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
