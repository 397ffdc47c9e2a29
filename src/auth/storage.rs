//! Persistence for accounts, employee profiles and sessions.
//!
//! The service only sees the [`AccountStore`] trait; [`PgAccountStore`] is the
//! Postgres implementation used by the server. Emails are normalized here, so
//! lookups are case-insensitive regardless of what the caller passes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::models::{
    CreateOutcome, EmployeeProfile, NewUser, Role, SeedOutcome, SessionRecord, UserRecord,
};
use super::utils::{is_unique_violation, normalize_email};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Insert the account and its employee profile in one transaction.
    /// Either both rows exist afterwards or neither does. A taken email and a
    /// taken RFC or NSS are reported as distinct outcomes.
    async fn create_employee(&self, user: &NewUser, profile: &EmployeeProfile)
    -> Result<CreateOutcome>;

    async fn insert_session(&self, user_id: Uuid, session_hash: &[u8], ttl_seconds: i64)
    -> Result<()>;

    /// Resolve an unexpired session belonging to an active user.
    async fn lookup_session(&self, session_hash: &[u8]) -> Result<Option<SessionRecord>>;

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()>;

    /// Mark the account verified when the token hash matches and has not expired.
    async fn mark_verified(&self, email: &str, token_hash: &[u8]) -> Result<bool>;

    /// Create an administrator, or promote and reactivate an existing account.
    async fn upsert_admin(&self, user: &NewUser) -> Result<SeedOutcome>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let query = r"
            SELECT id, email, password_hash, role, is_active, is_verified
            FROM users
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by email")?;

        Ok(row.map(|row| UserRecord {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: Role::from_db(row.get::<&str, _>("role")),
            is_active: row.get("is_active"),
            is_verified: row.get("is_verified"),
        }))
    }

    async fn create_employee(
        &self,
        user: &NewUser,
        profile: &EmployeeProfile,
    ) -> Result<CreateOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("begin employee transaction")?;

        let query = r"
            INSERT INTO users
                (id, email, password_hash, role, is_verified,
                 verification_token_hash, verification_token_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user.id)
            .bind(normalize_email(&user.email))
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.is_verified)
            .bind(user.verification_token_hash.as_deref())
            .bind(user.verification_expires_at)
            .execute(&mut *tx)
            .instrument(span)
            .await;

        if let Err(err) = result {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(CreateOutcome::EmailTaken);
            }
            return Err(err).context("failed to insert user");
        }

        // The profile shares the account identifier.
        let query = r"
            INSERT INTO employees
                (id, name, lastname, birthdate, rfc, nss, address, salary, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $1)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user.id)
            .bind(&profile.name)
            .bind(&profile.lastname)
            .bind(profile.birthdate)
            .bind(&profile.rfc)
            .bind(&profile.nss)
            .bind(&profile.address)
            .bind(profile.salary)
            .execute(&mut *tx)
            .instrument(span)
            .await;

        if let Err(err) = result {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(CreateOutcome::ProfileTaken);
            }
            return Err(err).context("failed to insert employee");
        }

        tx.commit().await.context("commit employee transaction")?;

        Ok(CreateOutcome::Created)
    }

    async fn insert_session(
        &self,
        user_id: Uuid,
        session_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<()> {
        let query = r"
            INSERT INTO user_sessions (user_id, session_hash, expires_at)
            VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .bind(session_hash)
            .bind(ttl_seconds)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert session")?;
        Ok(())
    }

    async fn lookup_session(&self, session_hash: &[u8]) -> Result<Option<SessionRecord>> {
        let query = r"
            SELECT users.id, users.email, users.role
            FROM user_sessions
            JOIN users ON users.id = user_sessions.user_id
            WHERE user_sessions.session_hash = $1
              AND user_sessions.expires_at > NOW()
              AND users.is_active
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(session_hash)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup session")?;

        let Some(row) = row else {
            return Ok(None);
        };

        // Activity only; the TTL is not extended.
        let query = "UPDATE user_sessions SET last_seen_at = NOW() WHERE session_hash = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update session last_seen_at")?;

        Ok(Some(SessionRecord {
            user_id: row.get("id"),
            email: row.get("email"),
            role: Role::from_db(row.get::<&str, _>("role")),
        }))
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()> {
        // Idempotent: deleting a missing session is fine.
        let query = "DELETE FROM user_sessions WHERE session_hash = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete session")?;
        Ok(())
    }

    async fn mark_verified(&self, email: &str, token_hash: &[u8]) -> Result<bool> {
        let query = r"
            UPDATE users
            SET is_verified = TRUE,
                verification_token_hash = NULL,
                verification_token_expires_at = NULL,
                updated_at = NOW()
            WHERE email = $1
              AND verification_token_hash = $2
              AND verification_token_expires_at > NOW()
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(normalize_email(email))
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to mark user verified")?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert_admin(&self, user: &NewUser) -> Result<SeedOutcome> {
        let query = r"
            INSERT INTO users (id, email, password_hash, role, is_active, is_verified)
            VALUES ($1, $2, $3, 'ADMIN', TRUE, TRUE)
            ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                role = 'ADMIN',
                is_active = TRUE,
                is_verified = TRUE,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(user.id)
            .bind(normalize_email(&user.email))
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to upsert administrator")?;

        if row.get::<bool, _>("inserted") {
            Ok(SeedOutcome::Created)
        } else {
            Ok(SeedOutcome::Promoted)
        }
    }

    async fn ping(&self) -> Result<()> {
        let query = "SELECT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("database ping failed")?;
        Ok(())
    }
}
