//! Append-only text logs for manual follow-up.
//!
//! Two sinks are kept by the worker: undeliverable emails (so an operator can
//! resend them by hand) and contact strings no email address could be
//! recovered from. Each record is a timestamped block appended to a plain
//! text file; the parent directory is created on first write.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use weather_core::mail::OutgoingEmail;
use weather_core::mailer::MailError;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An append-only text file.
#[derive(Debug, Clone)]
pub struct AppendLog {
    path: PathBuf,
}

impl AppendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` preceded by a UTC timestamp line.
    pub async fn append(&self, record: &str) -> Result<(), SinkError> {
        let io = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io)?;

        let entry = format!(
            "[{}]\n{}\n\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            record.trim_end()
        );
        file.write_all(entry.as_bytes()).await.map_err(io)?;
        file.flush().await.map_err(io)
    }

    /// Record an email the transport refused, with enough detail to resend.
    pub async fn record_failed_email(
        &self,
        email: &OutgoingEmail,
        error: &MailError,
    ) -> Result<(), SinkError> {
        let record = format!(
            "error: {error}\nfrom: {}\nto: {}\nsubject: {}\n\n{}",
            email.sender,
            email.recipients.join(", "),
            email.subject,
            email.body,
        );
        tracing::warn!(
            to = ?email.recipients,
            subject = %email.subject,
            error = %error,
            path = %self.path.display(),
            "Email delivery failed, appended to failed-email log",
        );
        self.append(&record).await
    }

    /// Record a contact string no address could be parsed from.
    pub async fn record_unparsable_contact(
        &self,
        fingerprint: &str,
        contact: &str,
    ) -> Result<(), SinkError> {
        tracing::info!(
            fingerprint,
            path = %self.path.display(),
            "Could not parse operator email from contact string",
        );
        self.append(&format!("fingerprint: {fingerprint}\ncontact: {contact}"))
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
