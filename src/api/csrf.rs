//! Double-submit cookie CSRF protection.
//!
//! - [`ensure_csrf_token`] issues a `csrfToken` cookie when the request has none and
//!   exposes the token to handlers through request and response extensions.
//! - [`verify_csrf_token`] rejects state-changing requests whose `x-csrf-token` header
//!   (or `_csrf` body field) does not match the cookie. Rejections are answered here
//!   with 403 and never reach a handler.
//! - [`rotate`] replaces the token after login and logout.
//!
//! Nothing is stored server side; the cookie max-age is the only expiry.
//!
//! Layer order matters: `ensure_csrf_token` must wrap `verify_csrf_token`.

use anyhow::{Context, Result};
use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{CONTENT_TYPE, InvalidHeaderValue, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
};
use constant_time_eq::constant_time_eq;
use rand::{RngCore, rngs::OsRng};
use serde_json::json;
use std::convert::Infallible;
use tracing::{error, warn};

use super::cookies::{build_cookie, cookie_value};
use crate::error::DomainError;

pub const CSRF_COOKIE_NAME: &str = "csrfToken";
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";
pub const CSRF_BODY_FIELD: &str = "_csrf";
pub const CSRF_TTL_SECONDS: i64 = 60 * 60;
pub const CSRF_REJECTED: &str = "Forbidden: Invalid or missing CSRF token";

const TOKEN_BYTES: usize = 32;
// Upper bound when buffering a body to look for `_csrf`.
const MAX_BODY_BYTES: usize = 64 * 1024;
const PROTECTED_METHODS: [Method; 4] = [Method::POST, Method::PUT, Method::DELETE, Method::PATCH];

/// 32 random bytes, hex encoded (64 characters).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// # Errors
    /// Returns an error if the OS random source fails.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate CSRF token")?;
        Ok(Self(hex::encode(bytes)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CsrfConfig {
    secure: bool,
}

impl CsrfConfig {
    #[must_use]
    pub const fn new(secure: bool) -> Self {
        Self { secure }
    }

    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    fn cookie(self, token: &CsrfToken) -> Result<HeaderValue, InvalidHeaderValue> {
        build_cookie(CSRF_COOKIE_NAME, token.as_str(), CSRF_TTL_SECONDS, self.secure)
    }
}

/// Response marker: the handler already set a fresh cookie.
#[derive(Clone, Copy, Debug)]
struct RotatedCsrfToken;

pub async fn ensure_csrf_token(
    State(config): State<CsrfConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let (token, fresh) = match cookie_value(request.headers(), CSRF_COOKIE_NAME) {
        Some(existing) => (CsrfToken(existing), false),
        None => match CsrfToken::generate() {
            Ok(token) => (token, true),
            Err(err) => {
                return DomainError::internal_from("failed to issue CSRF token", format!("{err:#}"))
                    .into_response();
            }
        },
    };

    request.extensions_mut().insert(token.clone());
    let mut response = next.run(request).await;

    if response.extensions().get::<RotatedCsrfToken>().is_some() {
        return response;
    }

    if fresh {
        match config.cookie(&token) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to build CSRF cookie: {err}"),
        }
    }
    response.extensions_mut().insert(token);

    response
}

pub async fn verify_csrf_token(request: Request, next: Next) -> Response {
    if !PROTECTED_METHODS.contains(request.method()) {
        return next.run(request).await;
    }

    let Some(expected) = cookie_value(request.headers(), CSRF_COOKIE_NAME) else {
        return reject("missing CSRF cookie");
    };

    let header_token = request
        .headers()
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let (request, supplied) = match header_token {
        Some(token) => (request, Some(token)),
        None => match body_token(request).await {
            Some(pair) => pair,
            None => return reject("unreadable request body"),
        },
    };

    match supplied {
        Some(supplied) if constant_time_eq(expected.as_bytes(), supplied.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => reject("CSRF token mismatch"),
        None => reject("missing CSRF token"),
    }
}

fn reject(reason: &str) -> Response {
    warn!("CSRF verification failed: {reason}");
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "errors": [{ "msg": CSRF_REJECTED }] })),
    )
        .into_response()
}

/// Buffer the body, look for `_csrf`, and hand back an equivalent request.
async fn body_token(request: Request) -> Option<(Request, Option<String>)> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES).await.ok()?;
    let token = body_field(&parts.headers, &bytes);
    Some((Request::from_parts(parts, Body::from(bytes)), token))
}

fn body_field(headers: &HeaderMap, bytes: &[u8]) -> Option<String> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let token = if content_type.starts_with("application/x-www-form-urlencoded") {
        url::form_urlencoded::parse(bytes)
            .find(|(key, _)| key == CSRF_BODY_FIELD)
            .map(|(_, value)| value.into_owned())
    } else {
        serde_json::from_slice::<serde_json::Value>(bytes)
            .ok()?
            .get(CSRF_BODY_FIELD)?
            .as_str()
            .map(str::to_string)
    };

    token.filter(|value| !value.is_empty())
}

/// A replacement token plus its cookie, applied as response parts.
#[derive(Debug)]
pub struct CsrfRotation {
    token: CsrfToken,
    cookie: HeaderValue,
}

impl CsrfRotation {
    #[must_use]
    pub fn token(&self) -> &CsrfToken {
        &self.token
    }
}

/// Issue a new token regardless of the current one.
///
/// # Errors
/// Returns an error if the token or its cookie cannot be built.
pub fn rotate(config: CsrfConfig) -> Result<CsrfRotation> {
    let token = CsrfToken::generate()?;
    let cookie = config
        .cookie(&token)
        .context("failed to build CSRF cookie")?;
    Ok(CsrfRotation { token, cookie })
}

impl IntoResponseParts for CsrfRotation {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.headers_mut().append(SET_COOKIE, self.cookie);
        res.extensions_mut().insert(RotatedCsrfToken);
        res.extensions_mut().insert(self.token);
        Ok(res)
    }
}
