use crate::{
    api::{
        self,
        email::{EmailSender, LogEmailSender, SmtpConfig, SmtpEmailSender},
    },
    auth::{AuthConfig, AuthService, PgAccountStore},
};
use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub production: bool,
    pub frontend_base_url: String,
    pub session_ttl_seconds: i64,
    pub verification_ttl_seconds: i64,
    pub db_timeout_seconds: u64,
    pub smtp: Option<SmtpConfig>,
}

/// Connect the shared Postgres pool.
pub(super) async fn connect(dsn: &str, timeout: Duration) -> Result<PgPool> {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(timeout)
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the mailer cannot be built, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let timeout = Duration::from_secs(args.db_timeout_seconds);
    let pool = connect(&args.dsn, timeout).await?;

    let mailer: Arc<dyn EmailSender> = match &args.smtp {
        Some(smtp) => {
            info!("Sending email through {}:{}", smtp.host(), smtp.port());
            Arc::new(SmtpEmailSender::new(smtp)?)
        }
        None => {
            warn!("No SMTP host configured, verification emails will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    let config = AuthConfig::new(args.frontend_base_url)
        .with_production(args.production)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_verification_ttl_seconds(args.verification_ttl_seconds)
        .with_store_timeout(timeout);

    let service = Arc::new(AuthService::new(
        Arc::new(PgAccountStore::new(pool)),
        config,
    ));

    api::new(args.port, service, mailer).await
}
