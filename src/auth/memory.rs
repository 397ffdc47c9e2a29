//! In-memory `AccountStore` for service and router tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use uuid::Uuid;

use super::{
    models::{
        CreateOutcome, EmployeeProfile, NewUser, Role, SeedOutcome, SessionRecord, UserRecord,
    },
    password::hash_password,
    storage::AccountStore,
    utils::normalize_email,
};

#[derive(Clone, Debug)]
struct StoredUser {
    record: UserRecord,
    verification_token_hash: Option<Vec<u8>>,
    verification_expires_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Clone, Debug)]
struct StoredSession {
    user_id: Uuid,
    expires_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, StoredUser>,
    employees: HashMap<Uuid, EmployeeProfile>,
    sessions: HashMap<Vec<u8>, StoredSession>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_employee_insert: AtomicBool,
    unavailable: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))
    }

    async fn io(&self) -> Result<()> {
        let delay = *self
            .delay
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }

    /// Insert an account directly, bypassing the service.
    pub fn add_user(&self, email: &str, password: &str, role: Role, is_active: bool) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let record = UserRecord {
            id,
            email: normalize_email(email),
            password_hash: hash_password(password)?,
            role,
            is_active,
            is_verified: true,
        };
        self.tables()?.users.insert(
            normalize_email(email),
            StoredUser {
                record,
                verification_token_hash: None,
                verification_expires_at: None,
            },
        );
        Ok(id)
    }

    /// Make the second insert of `create_employee` fail.
    pub fn fail_employee_insert(&self) {
        self.fail_employee_insert.store(true, Ordering::SeqCst);
    }

    /// Make every call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call, to exercise timeouts.
    pub fn set_delay(&self, delay: Duration) -> Result<()> {
        *self
            .delay
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))? = Some(delay);
        Ok(())
    }

    pub fn user(&self, email: &str) -> Option<UserRecord> {
        self.tables()
            .ok()?
            .users
            .get(&normalize_email(email))
            .map(|stored| stored.record.clone())
    }

    pub fn employee(&self, user_id: Uuid) -> Option<EmployeeProfile> {
        self.tables().ok()?.employees.get(&user_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.tables().map_or(0, |tables| tables.users.len())
    }

    pub fn employee_count(&self) -> usize {
        self.tables().map_or(0, |tables| tables.employees.len())
    }

    pub fn session_count(&self) -> usize {
        self.tables().map_or(0, |tables| tables.sessions.len())
    }

    pub fn expire_verification(&self, email: &str) -> Result<()> {
        if let Some(stored) = self.tables()?.users.get_mut(&normalize_email(email)) {
            stored.verification_expires_at = Some(Utc::now() - ChronoDuration::seconds(1));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.io().await?;
        Ok(self
            .tables()?
            .users
            .get(&normalize_email(email))
            .map(|stored| stored.record.clone()))
    }

    async fn create_employee(
        &self,
        user: &NewUser,
        profile: &EmployeeProfile,
    ) -> Result<CreateOutcome> {
        self.io().await?;
        let mut tables = self.tables()?;
        let email = normalize_email(&user.email);
        if tables.users.contains_key(&email) {
            return Ok(CreateOutcome::EmailTaken);
        }
        if tables
            .employees
            .values()
            .any(|existing| existing.rfc == profile.rfc || existing.nss == profile.nss)
        {
            return Ok(CreateOutcome::ProfileTaken);
        }
        // Both rows are staged before anything is written, so a failure leaves no trace.
        if self.fail_employee_insert.load(Ordering::SeqCst) {
            return Err(anyhow!("failed to insert employee"));
        }
        tables.users.insert(
            email.clone(),
            StoredUser {
                record: UserRecord {
                    id: user.id,
                    email,
                    password_hash: user.password_hash.clone(),
                    role: user.role,
                    is_active: true,
                    is_verified: user.is_verified,
                },
                verification_token_hash: user.verification_token_hash.clone(),
                verification_expires_at: user.verification_expires_at,
            },
        );
        tables.employees.insert(user.id, profile.clone());
        Ok(CreateOutcome::Created)
    }

    async fn insert_session(
        &self,
        user_id: Uuid,
        session_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<()> {
        self.io().await?;
        self.tables()?.sessions.insert(
            session_hash.to_vec(),
            StoredSession {
                user_id,
                expires_at: Utc::now() + ChronoDuration::seconds(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn lookup_session(&self, session_hash: &[u8]) -> Result<Option<SessionRecord>> {
        self.io().await?;
        let tables = self.tables()?;
        let Some(session) = tables.sessions.get(session_hash) else {
            return Ok(None);
        };
        if session.expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(tables
            .users
            .values()
            .find(|stored| stored.record.id == session.user_id && stored.record.is_active)
            .map(|stored| SessionRecord {
                user_id: stored.record.id,
                email: stored.record.email.clone(),
                role: stored.record.role,
            }))
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()> {
        self.io().await?;
        self.tables()?.sessions.remove(session_hash);
        Ok(())
    }

    async fn mark_verified(&self, email: &str, token_hash: &[u8]) -> Result<bool> {
        self.io().await?;
        let mut tables = self.tables()?;
        let Some(stored) = tables.users.get_mut(&normalize_email(email)) else {
            return Ok(false);
        };
        let matches = stored.verification_token_hash.as_deref() == Some(token_hash)
            && stored
                .verification_expires_at
                .is_some_and(|expires_at| expires_at > Utc::now());
        if matches {
            stored.record.is_verified = true;
            stored.verification_token_hash = None;
            stored.verification_expires_at = None;
        }
        Ok(matches)
    }

    async fn upsert_admin(&self, user: &NewUser) -> Result<SeedOutcome> {
        self.io().await?;
        let mut tables = self.tables()?;
        let email = normalize_email(&user.email);
        if let Some(stored) = tables.users.get_mut(&email) {
            stored.record.password_hash = user.password_hash.clone();
            stored.record.role = Role::Admin;
            stored.record.is_active = true;
            stored.record.is_verified = true;
            return Ok(SeedOutcome::Promoted);
        }
        tables.users.insert(
            email.clone(),
            StoredUser {
                record: UserRecord {
                    id: user.id,
                    email,
                    password_hash: user.password_hash.clone(),
                    role: Role::Admin,
                    is_active: true,
                    is_verified: true,
                },
                verification_token_hash: None,
                verification_expires_at: None,
            },
        );
        Ok(SeedOutcome::Created)
    }

    async fn ping(&self) -> Result<()> {
        self.io().await
    }
}
