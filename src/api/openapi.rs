#![allow(clippy::needless_for_each)]

use utoipa::OpenApi;

use super::handlers::{
    MessageResponse, MessageWithCsrf, ValidationErrors,
    csrf_token::{self, __path_csrf_token},
    health::{self, __path_health},
    logout::__path_logout,
    user_login::{self, __path_login},
    user_register::{self, __path_register},
    verify_email::{self, __path_verify_email},
};
use crate::error::ErrorBody;

#[derive(OpenApi)]
#[openapi(
    paths(health, csrf_token, login, logout, register, verify_email),
    components(schemas(
        health::Health,
        csrf_token::CsrfTokenResponse,
        user_login::LoginRequest,
        user_register::RegisterRequest,
        verify_email::VerifyEmailRequest,
        MessageResponse,
        MessageWithCsrf,
        ValidationErrors,
        ErrorBody,
    )),
    tags(
        (name = "auth", description = "Login, sessions, employee onboarding and CSRF tokens"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi();
        for path in [
            "/health",
            "/api/v1/auth/csrf-token",
            "/api/v1/auth/login",
            "/api/v1/auth/logout",
            "/api/v1/auth/register",
            "/api/v1/auth/verify-email",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
