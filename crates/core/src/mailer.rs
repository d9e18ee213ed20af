//! Mail transport seam.

use async_trait::async_trait;

use crate::mail::OutgoingEmail;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail transport timed out")]
    Timeout,
}

/// Sends rendered emails. Delivery is attempted once per message; retries
/// are left to the transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send every message, returning one result per message in order.
    async fn send_batch(&self, emails: &[OutgoingEmail]) -> Vec<Result<(), MailError>>;
}
