use axum::{
    Json,
    extract::Extension,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use super::{MessageWithCsrf, ValidationErrors, session::session_cookie, valid_email};
use crate::{
    api::csrf::rotate,
    auth::{AuthService, models::Credentials},
    error::{DomainError, ErrorBody},
    outcome::Fold,
};

pub const INVALID_EMAIL: &str = "Agregue un email valido";
pub const PASSWORD_REQUIRED: &str = "El password es obligatorio";

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    #[schema(value_type = String, format = Password)]
    password: SecretString,
}

impl LoginRequest {
    fn validate(self) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(valid_email(&self.email), "email", INVALID_EMAIL);
        errors.check(
            !self.password.expose_secret().is_empty(),
            "password",
            PASSWORD_REQUIRED,
        );
        errors.finish(|| Credentials {
            email: self.email.trim().to_string(),
            password: self.password,
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    params(
        ("x-csrf-token" = String, Header, description = "Must echo the csrfToken cookie"),
    ),
    responses(
        (status = 200, description = "Credentials validated; session and rotated CSRF cookies set", body = MessageWithCsrf),
        (status = 400, description = "Invalid payload", body = ValidationErrors),
        (status = 401, description = "Inactive account or wrong password", body = ErrorBody),
        (status = 403, description = "Missing or invalid CSRF token"),
        (status = 404, description = "Unknown email", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody),
    ),
    tag = "auth"
)]
// axum handler for login
#[instrument(skip_all)]
pub async fn login(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let credentials = match request.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return errors.into_response(),
    };

    let result = async {
        let account = service.validate_credentials(credentials).await?;
        let token = service.open_session(account.user_id).await?;
        let cookie = session_cookie(service.config(), &token)
            .map_err(|err| DomainError::internal_from("failed to build session cookie", err))?;
        // New CSRF token after authentication, so a planted one stops working.
        let rotation = rotate(service.config().csrf()).map_err(|err| {
            DomainError::internal_from("failed to rotate CSRF token", format!("{err:#}"))
        })?;
        Ok::<_, DomainError>((account, cookie, rotation))
    }
    .await;

    result.fold(
        |(account, cookie, rotation)| {
            let body = MessageWithCsrf {
                msg: account.message().to_string(),
                csrf_token: rotation.token().as_str().to_string(),
            };
            (AppendHeaders([(SET_COOKIE, cookie)]), rotation, Json(body)).into_response()
        },
        IntoResponse::into_response,
    )
}
