//! Outbound email: delivery abstraction and the verification template.
//!
//! `LogEmailSender` is the development default and only logs recipient and
//! subject. `SmtpEmailSender` delivers through lettre's async SMTP transport.
//! Registration sends after the database commit; a delivery failure is logged
//! and does not undo the account.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::auth::utils::build_verify_url;

pub const VERIFICATION_SUBJECT: &str = "Verifica tu cuenta";
const FROM_NAME: &str = "Store System";

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Development sender; the body is never logged because it carries a password.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    from: String,
}

impl SmtpConfig {
    #[must_use]
    pub fn new(host: String, username: String, password: SecretString) -> Self {
        Self {
            host,
            port: 465,
            from: username.clone(),
            username,
            password,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: String) -> Self {
        self.from = from;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn from_address(&self) -> &str {
        &self.from
    }
}

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpEmailSender {
    /// # Errors
    /// Returns an error if the relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        // 465 speaks TLS from the first byte; other ports upgrade with STARTTLS.
        let relay = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        };
        let transport = relay
            .with_context(|| format!("invalid SMTP relay: {}", config.host))?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from: format!("{FROM_NAME} <{}>", config.from),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.parse().context("invalid from address")?)
            .to(message.to_email.parse().context("invalid to address")?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .context("failed to build email")?;

        self.transport
            .send(email)
            .await
            .context("failed to send email")?;
        Ok(())
    }
}

/// Build the welcome message with the verification link and temporary password.
#[must_use]
pub fn verification_email(
    frontend_base_url: &str,
    to_email: &str,
    token: &str,
    temporary_password: &SecretString,
) -> EmailMessage {
    let url = html_escape(&build_verify_url(frontend_base_url, token, to_email));
    let password = html_escape(temporary_password.expose_secret());
    let html_body = format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{VERIFICATION_SUBJECT}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h1 style="color: #2563eb;">Verifica tu email</h1>
        <p>¡Bienvenido a Store System!</p>
        <p>Hemos creado tu cuenta exitosamente. Para activarla necesitas verificar tu correo electrónico.</p>
        <p style="margin: 30px 0;">
            <a href="{url}"
               style="display: inline-block; background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px;">
                Verificar mi cuenta
            </a>
        </p>
        <div style="background: #f8f9fa; padding: 12px; border-radius: 4px;">
            <p>Tu contraseña temporal es: <strong>{password}</strong></p>
            <p>Recuerda cambiarla por una que puedas recordar.</p>
        </div>
        <p><strong>Importante:</strong> Este enlace expirará en 1 hora.</p>
        <p style="color: #6c757d; font-size: 14px;">Si no solicitaste esta cuenta, puedes ignorar este correo de forma segura.</p>
        <p style="color: #666; font-size: 12px; margin-top: 40px;">Atentamente, el equipo de Store System</p>
    </div>
</body>
</html>
"#
    );

    EmailMessage {
        to_email: to_email.to_string(),
        subject: VERIFICATION_SUBJECT.to_string(),
        html_body,
    }
}

fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
