//! Mailer used when no SMTP relay is configured.

use async_trait::async_trait;
use weather_core::mail::OutgoingEmail;
use weather_core::mailer::{MailError, Mailer};

/// Logs every message instead of sending it. Each send reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunMailer;

#[async_trait]
impl Mailer for DryRunMailer {
    async fn send_batch(&self, emails: &[OutgoingEmail]) -> Vec<Result<(), MailError>> {
        emails
            .iter()
            .map(|email| {
                tracing::info!(
                    to = ?email.recipients,
                    subject = %email.subject,
                    body_len = email.body.len(),
                    "SMTP not configured, skipping notification email",
                );
                Ok(())
            })
            .collect()
    }
}
