//! # Store
//!
//! Backend for the store system: staff log in with email and password, administrators
//! onboard employees, and every state-changing request is guarded by a double-submit
//! CSRF token.
//!
//! ## Sessions
//!
//! A successful login issues an opaque session token in an `HttpOnly` cookie. Only the
//! SHA-256 of the token is stored, together with its expiry, so a leaked table cannot
//! be replayed.
//!
//! ## CSRF
//!
//! Every response under `/api/v1/auth` carries a `csrfToken` cookie. Unsafe methods must
//! echo it in the `x-csrf-token` header or a `_csrf` body field. Login and logout rotate
//! the token and return the new value in the body.
//!
//! ## Errors
//!
//! Business failures are [`error::DomainError`] values. Handlers fold them into
//! `{status, name, msg}` bodies; internal causes are logged, never returned.

pub mod api;
pub mod auth;
pub mod cli;
pub mod error;
pub mod outcome;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
