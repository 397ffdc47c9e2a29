use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use super::{MessageResponse, ValidationErrors, user_login::INVALID_EMAIL, valid_email};
use crate::{auth::AuthService, error::ErrorBody, outcome::Fold};

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    params(
        ("x-csrf-token" = String, Header, description = "Must echo the csrfToken cookie"),
    ),
    responses(
        (status = 200, description = "Account verified", body = MessageResponse),
        (status = 400, description = "Invalid payload", body = ValidationErrors),
        (status = 403, description = "Missing or invalid CSRF token"),
        (status = 404, description = "Invalid or expired token", body = ErrorBody),
    ),
    tag = "auth"
)]
// axum handler for email verification
#[instrument(skip_all)]
pub async fn verify_email(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Response {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let mut errors = ValidationErrors::default();
    errors.check(valid_email(&request.email), "email", INVALID_EMAIL);
    errors.check(
        !request.token.trim().is_empty(),
        "token",
        "El token es obligatorio",
    );
    if !errors.is_empty() {
        return errors.into_response();
    }

    service
        .verify_email(request.email.trim(), request.token.trim())
        .await
        .fold(
            |msg| (StatusCode::OK, Json(MessageResponse::new(msg))).into_response(),
            IntoResponse::into_response,
        )
}
