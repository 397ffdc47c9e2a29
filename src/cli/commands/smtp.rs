use anyhow::{Result, anyhow};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::api::email::SmtpConfig;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";

/// SMTP settings, or `None` when no host is configured and mail is only logged.
///
/// # Errors
/// Returns an error if a host is given without credentials.
pub fn parse(matches: &ArgMatches) -> Result<Option<SmtpConfig>> {
    let Some(host) = matches.get_one::<String>(ARG_SMTP_HOST).cloned() else {
        return Ok(None);
    };

    let username = matches
        .get_one::<String>(ARG_SMTP_USERNAME)
        .cloned()
        .ok_or_else(|| anyhow!("--{ARG_SMTP_USERNAME} is required with --{ARG_SMTP_HOST}"))?;
    let password = matches
        .get_one::<String>(ARG_SMTP_PASSWORD)
        .cloned()
        .ok_or_else(|| anyhow!("--{ARG_SMTP_PASSWORD} is required with --{ARG_SMTP_HOST}"))?;

    let mut config = SmtpConfig::new(host, username, SecretString::from(password));
    if let Some(port) = matches.get_one::<u16>(ARG_SMTP_PORT) {
        config = config.with_port(*port);
    }
    if let Some(from) = matches.get_one::<String>(ARG_SMTP_FROM) {
        config = config.with_from(from.clone());
    }
    Ok(Some(config))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host; without it verification emails are only logged")
                .env("STORE_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP port, 465 uses implicit TLS and anything else STARTTLS")
                .env("STORE_SMTP_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username")
                .env("STORE_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("STORE_SMTP_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long(ARG_SMTP_FROM)
                .help("Sender address, defaults to the SMTP username")
                .env("STORE_SMTP_FROM"),
        )
}
