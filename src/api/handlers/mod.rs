pub mod csrf_token;
pub use self::csrf_token::csrf_token;

pub mod health;
pub use self::health::health;

pub mod logout;
pub use self::logout::logout;

pub mod session;

pub mod user_login;
pub use self::user_login::login;

pub mod user_register;
pub use self::user_register::register;

pub mod verify_email;
pub use self::verify_email::verify_email;

// common types and checks for the handlers
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email.trim()))
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Success body for endpoints that rotate the CSRF token.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageWithCsrf {
    pub msg: String,
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub msg: String,
    pub path: String,
    pub location: String,
}

/// Request validation failures, answered as `400 {errors: [...]}`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, path: &str, msg: &str) {
        self.errors.push(FieldError {
            msg: msg.to_string(),
            path: path.to_string(),
            location: "body".to_string(),
        });
    }

    /// Record `msg` for `path` unless `ok` holds.
    pub fn check(&mut self, ok: bool, path: &str, msg: &str) {
        if !ok {
            self.push(path, msg);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(value)` when nothing was recorded.
    ///
    /// # Errors
    /// Returns `self` when at least one check failed.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
