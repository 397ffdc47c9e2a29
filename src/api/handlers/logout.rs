use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    MessageWithCsrf,
    session::{clear_session_cookie, session_token},
};
use crate::{api::csrf::rotate, auth::AuthService, error::DomainError, outcome::Fold};

pub const LOGGED_OUT: &str = "Sesion cerrada correctamente";

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    params(
        ("x-csrf-token" = String, Header, description = "Must echo the csrfToken cookie"),
    ),
    responses(
        (status = 200, description = "Session cleared and CSRF token rotated", body = MessageWithCsrf),
        (status = 403, description = "Missing or invalid CSRF token"),
    ),
    tag = "auth"
)]
// axum handler for logout
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, Extension(service): Extension<Arc<AuthService>>) -> Response {
    // Idempotent: the cookie is cleared even when the session is unknown or the delete fails.
    if let Some(token) = session_token(&headers) {
        let _ = service.close_session(&token).await;
    }

    let result = clear_session_cookie(service.config())
        .map_err(|err| DomainError::internal_from("failed to build session cookie", err))
        .and_then(|cleared| {
            rotate(service.config().csrf())
                .map(|rotation| (cleared, rotation))
                .map_err(|err| {
                    DomainError::internal_from("failed to rotate CSRF token", format!("{err:#}"))
                })
        });

    result.fold(
        |(cleared, rotation)| {
            let body = MessageWithCsrf {
                msg: LOGGED_OUT.to_string(),
                csrf_token: rotation.token().as_str().to_string(),
            };
            (AppendHeaders([(SET_COOKIE, cleared)]), rotation, Json(body)).into_response()
        },
        IntoResponse::into_response,
    )
}
