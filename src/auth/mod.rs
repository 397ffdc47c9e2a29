//! Account domain: credential checks, employee onboarding, sessions and
//! email verification, behind an injected [`AccountStore`].

mod config;
#[cfg(test)]
pub(crate) mod memory;
pub mod models;
pub mod password;
pub mod service;
pub mod storage;
pub mod utils;

pub use config::AuthConfig;
pub use service::AuthService;
pub use storage::{AccountStore, PgAccountStore};
