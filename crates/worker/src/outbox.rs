//! Renders a pass's notifications and hands them to the mailer as one batch.

use std::sync::Arc;

use weather_core::mail::MailComposer;
use weather_core::mailer::{MailError, Mailer};
use weather_core::notice::Notification;
use weather_events::AppendLog;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct Outbox {
    mailer: Arc<dyn Mailer>,
    composer: MailComposer,
    failed_log: AppendLog,
}

impl Outbox {
    pub fn new(mailer: Arc<dyn Mailer>, composer: MailComposer, failed_log: AppendLog) -> Self {
        Self {
            mailer,
            composer,
            failed_log,
        }
    }

    /// Send every notification once. Failures go to the failed-email log;
    /// the subscriptions behind them stay marked as emailed.
    pub async fn deliver(&self, notifications: &[Notification]) -> DeliveryReport {
        if notifications.is_empty() {
            return DeliveryReport::default();
        }

        let emails: Vec<_> = notifications
            .iter()
            .map(|n| self.composer.compose(n))
            .collect();
        let results = self.mailer.send_batch(&emails).await;

        let mut report = DeliveryReport::default();
        for (index, email) in emails.iter().enumerate() {
            let result = results
                .get(index)
                .cloned()
                .unwrap_or_else(|| Err(MailError::Transport("no result from mailer".into())));
            match result {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    report.failed += 1;
                    if let Err(e) = self.failed_log.record_failed_email(email, &error).await {
                        tracing::error!(
                            error = %e,
                            to = ?email.recipients,
                            "Could not record failed email",
                        );
                    }
                }
            }
        }

        tracing::info!(
            queued = emails.len(),
            sent = report.sent,
            failed = report.failed,
            "Notification batch delivered",
        );
        report
    }
}
