use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use uuid::Uuid;

/// Confirmation returned by a successful credential check.
pub const CREDENTIALS_VALIDATED: &str = "Usuario validado correctamente";

/// Confirmation returned after an employee is onboarded.
pub const EMPLOYEE_CREATED: &str = "Employee created successfully";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Employee => "EMPLOYEE",
        }
    }

    /// Unknown values fall back to the unprivileged role.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        if value.eq_ignore_ascii_case("ADMIN") {
            Self::Admin
        } else {
            Self::Employee
        }
    }
}

/// Account row as the service needs it.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
}

/// Account row ready to insert; the password is already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub verification_token_hash: Option<Vec<u8>>,
    pub verification_expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmployeeProfile {
    pub name: String,
    pub lastname: String,
    pub birthdate: NaiveDate,
    pub rfc: String,
    pub nss: String,
    pub address: String,
    pub salary: f64,
}

#[derive(Debug)]
pub struct EmployeeRegistration {
    pub email: String,
    pub password: SecretString,
    pub profile: EmployeeProfile,
}

/// What the caller needs to send the verification email once the records are committed.
#[derive(Debug)]
pub struct CreatedEmployee {
    pub user_id: Uuid,
    pub email: String,
    pub verification_token: String,
    pub temporary_password: SecretString,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedAccount {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl ValidatedAccount {
    #[must_use]
    pub fn message(&self) -> &'static str {
        CREDENTIALS_VALIDATED
    }
}

/// Never logged: `Debug` only prints the email.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    EmailTaken,
    /// The RFC or NSS already belongs to another employee.
    ProfileTaken,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    Promoted,
}
