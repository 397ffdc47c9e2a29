use axum::{Json, extract::Extension, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::csrf::CsrfToken;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CsrfTokenResponse {
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/csrf-token",
    responses(
        (status = 200, description = "Current CSRF token, also set as the csrfToken cookie", body = CsrfTokenResponse),
    ),
    tag = "auth"
)]
// axum handler for the CSRF token
pub async fn csrf_token(Extension(token): Extension<CsrfToken>) -> impl IntoResponse {
    Json(CsrfTokenResponse {
        csrf_token: token.as_str().to_string(),
    })
}
