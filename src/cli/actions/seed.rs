use crate::{
    api::handlers::valid_email,
    auth::{
        AuthConfig, AuthService, PgAccountStore,
        models::{Credentials, SeedOutcome},
        utils::normalize_email,
    },
    cli::actions::server::connect,
};
use anyhow::{Result, anyhow, bail};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::info;

pub struct Args {
    pub dsn: String,
    pub production: bool,
    pub db_timeout_seconds: u64,
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("production", &self.production)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Create the first administrator, or promote and reactivate an existing account.
/// # Errors
/// Returns an error in production, or if the database call fails.
pub async fn execute(args: Args) -> Result<()> {
    if args.production {
        bail!("seed-admin is disabled in production");
    }

    let email = normalize_email(&args.email);
    if !valid_email(&email) {
        bail!("Invalid administrator email: {email}");
    }

    let timeout = Duration::from_secs(args.db_timeout_seconds);
    let pool = connect(&args.dsn, timeout).await?;

    // Only the store timeout matters here; the URL is never used to build links.
    let service = AuthService::new(
        Arc::new(PgAccountStore::new(pool)),
        AuthConfig::new(String::new()).with_store_timeout(timeout),
    );

    let outcome = service
        .seed_admin(Credentials {
            email: email.clone(),
            password: args.password,
        })
        .await
        .map_err(|err| anyhow!("Failed to seed administrator: {err}"))?;

    match outcome {
        SeedOutcome::Created => info!("Administrator {email} created"),
        SeedOutcome::Promoted => info!("Existing account {email} promoted to administrator"),
    }
    Ok(())
}
