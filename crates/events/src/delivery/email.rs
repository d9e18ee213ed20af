//! Notification delivery via SMTP.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport to send the
//! plain-text weather reports. Configuration is loaded from environment
//! variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns
//! `None` and the worker falls back to the dry-run mailer.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use weather_core::mail::OutgoingEmail;
use weather_core::mailer::{MailError, Mailer};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    #[error("SMTP send timed out after {0:?}")]
    Timeout(Duration),
}

impl From<EmailError> for MailError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::Address(e) => MailError::InvalidAddress(e.to_string()),
            EmailError::Timeout(_) => MailError::Timeout,
            other => MailError::Transport(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default per-message send timeout in seconds.
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 30;

/// Configuration for the SMTP transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    /// Defaults to 587.
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Upper bound for sending one message.
    pub timeout: Duration,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that mail should
    /// be logged instead of sent.
    ///
    /// | Variable            | Required | Default |
    /// |---------------------|----------|---------|
    /// | `SMTP_HOST`         | yes      | -       |
    /// | `SMTP_PORT`         | no       | `587`   |
    /// | `SMTP_USER`         | no       | -       |
    /// | `SMTP_PASSWORD`     | no       | -       |
    /// | `MAIL_TIMEOUT_SECS` | no       | `30`    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            timeout: Duration::from_secs(
                std::env::var("MAIL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAIL_TIMEOUT_SECS),
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// Sends rendered weather reports over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    timeout: Duration,
}

impl SmtpMailer {
    /// Build the transport. Connections are opened lazily on first send.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .timeout(Some(config.timeout));

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            timeout: config.timeout,
        })
    }

    /// Send one message.
    pub async fn deliver(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = build_message(email)?;
        tokio::time::timeout(self.timeout, self.transport.send(message))
            .await
            .map_err(|_| EmailError::Timeout(self.timeout))??;

        tracing::info!(
            to = ?email.recipients,
            subject = %email.subject,
            "Notification email sent",
        );
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_batch(&self, emails: &[OutgoingEmail]) -> Vec<Result<(), MailError>> {
        let mut results = Vec::with_capacity(emails.len());
        for email in emails {
            results.push(self.deliver(email).await.map_err(MailError::from));
        }
        results
    }
}

/// Assemble a plain-text MIME message.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, EmailError> {
    let mut builder = Message::builder()
        .from(email.sender.parse()?)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN);
    for recipient in &email.recipients {
        builder = builder.to(recipient.parse()?);
    }
    builder
        .body(email.body.clone())
        .map_err(|e| EmailError::Build(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            subject: "[Tor Weather] Node Down!".to_string(),
            body: "This is a Tor Weather Report.".to_string(),
            sender: "tor-ops@torproject.org".to_string(),
            recipients: vec![to.to_string()],
        }
    }

    #[test]
    fn builds_plain_text_message() {
        let message = build_message(&email("op@example.org")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: [Tor Weather] Node Down!"));
        assert!(raw.contains("To: op@example.org"));
        assert!(raw.contains("From: tor-ops@torproject.org"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn invalid_recipient_is_address_error() {
        let err = build_message(&email("not-an-email")).unwrap_err();
        assert!(matches!(err, EmailError::Address(_)));
        assert!(matches!(MailError::from(err), MailError::InvalidAddress(_)));
    }

    #[test]
    fn message_without_recipients_fails_to_build() {
        let mut no_to = email("op@example.org");
        no_to.recipients.clear();
        assert!(matches!(build_message(&no_to), Err(EmailError::Build(_))));
    }

    #[test]
    fn timeout_maps_to_mail_timeout() {
        let err = EmailError::Timeout(Duration::from_secs(1));
        assert!(matches!(MailError::from(err), MailError::Timeout));
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
