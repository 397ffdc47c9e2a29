//! Authentication and onboarding rules.
//!
//! Every operation returns `Result<_, DomainError>`. Business failures are
//! values; infrastructure failures (store errors, timeouts, join errors) are
//! logged and collapsed into `DomainError::Internal`.

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::{future::Future, sync::Arc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    config::AuthConfig,
    models::{
        CreateOutcome, CreatedEmployee, Credentials, EmployeeRegistration, NewUser, Role,
        SeedOutcome, SessionRecord, ValidatedAccount,
    },
    password::{hash_password, verify_password},
    storage::AccountStore,
    utils::{generate_session_token, generate_verification_token, hash_token},
};
use crate::error::DomainError;

pub const USER_NOT_FOUND: &str = "Usuario no encontrado";
pub const USER_INACTIVE: &str = "Usuario dado de baja";
pub const INVALID_PASSWORD: &str = "Password incorrecto";
pub const ADMIN_NOT_FOUND: &str = "Administrador no encontrado";
pub const ADMIN_REQUIRED: &str = "Solo un administrador puede registrar empleados";
pub const EMAIL_TAKEN: &str = "El email ya esta registrado";
pub const PROFILE_TAKEN: &str = "El RFC o NSS ya esta registrado";
pub const EMAIL_VERIFIED: &str = "Cuenta verificada correctamente";
pub const INVALID_VERIFICATION: &str = "Token de verificacion invalido o expirado";

pub struct AuthService {
    store: Arc<dyn AccountStore>,
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Await a store call under the configured timeout.
    async fn bounded<T>(
        &self,
        context: &str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, DomainError> {
        match tokio::time::timeout(self.config.store_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(DomainError::internal_from(context, format!("{err:#}"))),
            Err(elapsed) => Err(DomainError::internal_from(context, elapsed)),
        }
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    /// `NotFound` for an unknown email, `Unauthorized` for an inactive account or
    /// a wrong password, `Internal` for store or hashing failures.
    #[instrument(skip_all)]
    pub async fn validate_credentials(
        &self,
        credentials: Credentials,
    ) -> Result<ValidatedAccount, DomainError> {
        let user = self
            .bounded(
                "failed to lookup user",
                self.store.find_user_by_email(&credentials.email),
            )
            .await?
            .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;

        if !user.is_active {
            debug!(user_id = %user.id, "login rejected: inactive account");
            return Err(DomainError::unauthorized(USER_INACTIVE));
        }

        let password = credentials.password;
        let stored_hash = user.password_hash.clone();
        let verified = run_blocking("failed to verify password", move || {
            verify_password(password.expose_secret(), &stored_hash)
        })
        .await?;

        if !verified {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(DomainError::unauthorized(INVALID_PASSWORD));
        }

        Ok(ValidatedAccount {
            user_id: user.id,
            email: user.email,
            role: user.role,
        })
    }

    /// Create an employee account and profile on behalf of an administrator.
    ///
    /// # Errors
    /// `NotFound` when the requester does not exist, `Unauthorized` when it is
    /// not an administrator, `Conflict` for a taken email, RFC or NSS, `Internal`
    /// otherwise.
    #[instrument(skip_all)]
    pub async fn create_employee(
        &self,
        registration: EmployeeRegistration,
        requesting_admin_email: &str,
    ) -> Result<CreatedEmployee, DomainError> {
        let requester = self
            .bounded(
                "failed to lookup requesting admin",
                self.store.find_user_by_email(requesting_admin_email),
            )
            .await?
            .ok_or_else(|| DomainError::not_found(ADMIN_NOT_FOUND))?;

        if requester.role != Role::Admin {
            warn!(user_id = %requester.id, "employee registration rejected: not an admin");
            return Err(DomainError::unauthorized(ADMIN_REQUIRED));
        }

        let password = SecretString::from(registration.password.expose_secret().to_owned());
        let password_hash = run_blocking("failed to hash password", move || {
            hash_password(password.expose_secret())
        })
        .await?;

        let verification_token = generate_verification_token()
            .map_err(|err| DomainError::internal_from("failed to create verification token", err))?;

        let user = NewUser {
            id: Uuid::now_v7(),
            email: registration.email.clone(),
            password_hash,
            role: Role::Employee,
            is_verified: false,
            verification_token_hash: Some(hash_token(&verification_token)),
            verification_expires_at: Some(
                Utc::now() + ChronoDuration::seconds(self.config.verification_ttl_seconds()),
            ),
        };

        let outcome = self
            .bounded(
                "failed to create employee",
                self.store.create_employee(&user, &registration.profile),
            )
            .await?;

        match outcome {
            CreateOutcome::Created => {
                info!(user_id = %user.id, "employee created");
                Ok(CreatedEmployee {
                    user_id: user.id,
                    email: registration.email,
                    verification_token,
                    temporary_password: registration.password,
                })
            }
            CreateOutcome::EmailTaken => Err(DomainError::conflict(EMAIL_TAKEN)),
            CreateOutcome::ProfileTaken => Err(DomainError::conflict(PROFILE_TAKEN)),
        }
    }

    /// Start a session and return the raw token for the cookie.
    ///
    /// # Errors
    /// `Internal` when the token cannot be generated or stored.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn open_session(&self, user_id: Uuid) -> Result<String, DomainError> {
        let token = generate_session_token()
            .map_err(|err| DomainError::internal_from("failed to create session token", err))?;
        self.bounded(
            "failed to insert session",
            self.store.insert_session(
                user_id,
                &hash_token(&token),
                self.config.session_ttl_seconds(),
            ),
        )
        .await?;
        Ok(token)
    }

    /// Resolve a raw session token; `Ok(None)` for unknown or expired sessions.
    ///
    /// # Errors
    /// `Internal` on store failures.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<SessionRecord>, DomainError> {
        self.bounded(
            "failed to lookup session",
            self.store.lookup_session(&hash_token(token)),
        )
        .await
    }

    /// # Errors
    /// `Internal` on store failures.
    pub async fn close_session(&self, token: &str) -> Result<(), DomainError> {
        self.bounded(
            "failed to delete session",
            self.store.delete_session(&hash_token(token)),
        )
        .await
    }

    /// Consume an email verification token.
    ///
    /// # Errors
    /// `NotFound` when the token does not match the account or has expired.
    #[instrument(skip_all)]
    pub async fn verify_email(&self, email: &str, token: &str) -> Result<&'static str, DomainError> {
        let verified = self
            .bounded(
                "failed to verify email",
                self.store.mark_verified(email, &hash_token(token)),
            )
            .await?;
        if verified {
            Ok(EMAIL_VERIFIED)
        } else {
            Err(DomainError::not_found(INVALID_VERIFICATION))
        }
    }

    /// Create the first administrator, or promote an existing account.
    ///
    /// # Errors
    /// `Internal` on hashing or store failures.
    #[instrument(skip_all)]
    pub async fn seed_admin(&self, credentials: Credentials) -> Result<SeedOutcome, DomainError> {
        let password = credentials.password;
        let password_hash = run_blocking("failed to hash password", move || {
            hash_password(password.expose_secret())
        })
        .await?;

        let user = NewUser {
            id: Uuid::now_v7(),
            email: credentials.email,
            password_hash,
            role: Role::Admin,
            is_verified: true,
            verification_token_hash: None,
            verification_expires_at: None,
        };
        self.bounded("failed to seed admin", self.store.upsert_admin(&user))
            .await
    }

    /// # Errors
    /// `Internal` when the store does not answer.
    pub async fn ping(&self) -> Result<(), DomainError> {
        self.bounded("database ping failed", self.store.ping()).await
    }
}

/// Run CPU-heavy work (argon2) off the async workers.
async fn run_blocking<T, F>(context: &str, work: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("blocking task failed")
        .and_then(|result| result)
        .map_err(|err| DomainError::internal_from(context, format!("{err:#}")))
}
