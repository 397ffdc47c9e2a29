//! Session cookie handling.

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};

use crate::{
    api::cookies::{build_cookie, cookie_value},
    auth::{AuthConfig, AuthService, models::SessionRecord},
    error::DomainError,
};

pub const SESSION_COOKIE_NAME: &str = "store_session";
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

/// `HttpOnly` session cookie; `Secure` only in production.
pub fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(
        SESSION_COOKIE_NAME,
        token,
        config.session_ttl_seconds(),
        config.cookie_secure(),
    )
}

pub fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(SESSION_COOKIE_NAME, "", 0, config.cookie_secure())
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE_NAME)
}

/// Resolve the session cookie into the signed-in account.
///
/// # Errors
/// `Unauthorized` when the cookie is missing, unknown or expired.
pub async fn authenticate(
    headers: &HeaderMap,
    service: &AuthService,
) -> Result<SessionRecord, DomainError> {
    let token = session_token(headers).ok_or_else(|| DomainError::unauthorized(AUTHENTICATION_REQUIRED))?;
    service
        .resolve_session(&token)
        .await?
        .ok_or_else(|| DomainError::unauthorized(AUTHENTICATION_REQUIRED))
}
