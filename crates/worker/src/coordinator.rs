//! The run coordinator: one pass of registry refresh, subscription checks
//! and notification delivery.
//!
//! Passes never overlap. [`RunCoordinator::run_pass`] takes an in-process
//! lock with `try_lock`; a trigger that arrives while a pass is in flight
//! gets [`PassError::AlreadyRunning`] and touches nothing.
//!
//! Ordering within a pass:
//!
//! 1. Fetch one snapshot set (bounded by the source timeout). Any failure,
//!    including an internally inconsistent set, aborts before any write.
//! 2. Reconcile the router registry and apply it in one store transaction.
//! 3. Resolve welcome candidates to operator addresses.
//! 4. Evaluate subscriptions against the refreshed routers. From here on
//!    store errors are logged per kind or per subscription and the pass
//!    carries on.
//! 5. Send all notifications as one batch.
//!
//! Dropping the pass future before step 5 discards the queued
//! notifications; subscriptions already saved keep `emailed = true`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use weather_core::notice::{Notification, NoticeKind, RouterLabel};
use weather_core::registry::{reconcile, RegistryContext, WelcomeCandidate};
use weather_core::source::RelaySource;
use weather_core::store::WeatherStore;
use weather_core::types::Timestamp;
use weather_events::AppendLog;

use crate::checks::SubscriptionChecks;
use crate::error::PassError;
use crate::outbox::Outbox;

/// Default bound on one snapshot fetch.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Counts describing one completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub routers_listed: usize,
    pub routers_created: usize,
    pub routers_updated: usize,
    pub routers_evicted: usize,
    pub welcomes_queued: usize,
    pub unparsable_contacts: usize,
    pub subscriptions_evaluated: usize,
    pub subscriptions_saved: usize,
    pub subscriptions_skipped: usize,
    pub save_failures: usize,
    pub listing_failures: usize,
    pub notifications: HashMap<NoticeKind, usize>,
    pub emails_sent: usize,
    pub emails_failed: usize,
}

impl PassReport {
    /// Notifications queued of one kind.
    pub fn notified(&self, kind: NoticeKind) -> usize {
        self.notifications.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_notified(&self) -> usize {
        self.notifications.values().sum()
    }
}

pub struct RunCoordinator {
    store: Arc<dyn WeatherStore>,
    source: Arc<dyn RelaySource>,
    outbox: Outbox,
    unparsable_contacts: AppendLog,
    deployment_time: Timestamp,
    source_timeout: Duration,
    pass_lock: Mutex<()>,
}

impl RunCoordinator {
    /// `deployment_time` is read once at startup from the store.
    pub fn new(
        store: Arc<dyn WeatherStore>,
        source: Arc<dyn RelaySource>,
        outbox: Outbox,
        unparsable_contacts: AppendLog,
        deployment_time: Timestamp,
    ) -> Self {
        Self {
            store,
            source,
            outbox,
            unparsable_contacts,
            deployment_time,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Run one pass as of `now`.
    pub async fn run_pass(&self, now: Timestamp) -> Result<PassReport, PassError> {
        let _guard = self
            .pass_lock
            .try_lock()
            .map_err(|_| PassError::AlreadyRunning)?;

        tracing::info!(%now, "Pass started");
        let result = self.execute(now).await;
        match &result {
            Ok(report) => tracing::info!(
                routers_listed = report.routers_listed,
                notified = report.total_notified(),
                emails_sent = report.emails_sent,
                emails_failed = report.emails_failed,
                "Pass completed",
            ),
            Err(e) => tracing::error!(error = %e, "Pass aborted"),
        }
        result
    }

    async fn execute(&self, now: Timestamp) -> Result<PassReport, PassError> {
        let snapshots = tokio::time::timeout(self.source_timeout, self.source.fetch())
            .await
            .map_err(|_| PassError::SourceTimeout(self.source_timeout))??;

        let known = self.store.list_routers().await?;
        let ctx = RegistryContext {
            now,
            deployment_time: self.deployment_time,
        };
        let update = reconcile(&known, &snapshots, ctx);
        self.store.apply_registry(&update).await?;

        let mut report = PassReport {
            routers_listed: update.listed_count(),
            routers_created: update.created.len(),
            routers_updated: update.updated.len(),
            routers_evicted: update.evicted.len(),
            ..PassReport::default()
        };
        tracing::info!(
            snapshots = snapshots.len(),
            listed = report.routers_listed,
            created = report.routers_created,
            updated = report.routers_updated,
            evicted = report.routers_evicted,
            "Router registry updated",
        );

        let mut notifications = Vec::new();
        for candidate in &update.welcomes {
            match self.welcome(candidate).await {
                Some(notification) => notifications.push(notification),
                None => report.unparsable_contacts += 1,
            }
        }
        report.welcomes_queued = notifications.len();

        let outcome = SubscriptionChecks::new(self.store.as_ref(), &snapshots, now)
            .run()
            .await;
        for tally in outcome.tallies.values() {
            report.subscriptions_evaluated += tally.evaluated;
            report.subscriptions_saved += tally.saved;
            report.subscriptions_skipped += tally.skipped;
            report.save_failures += tally.save_failures;
            report.listing_failures += tally.listing_failures;
        }
        notifications.extend(outcome.notifications);

        for notification in &notifications {
            *report.notifications.entry(notification.kind()).or_default() += 1;
        }

        let delivery = self.outbox.deliver(&notifications).await;
        report.emails_sent = delivery.sent;
        report.emails_failed = delivery.failed;

        Ok(report)
    }

    /// Resolve the operator address for a welcome. Unparsable contacts are
    /// recorded and yield nothing; the router stays welcomed either way.
    async fn welcome(&self, candidate: &WelcomeCandidate) -> Option<Notification> {
        if let Some(recipient) = candidate.recipient() {
            tracing::debug!(fingerprint = %candidate.fingerprint, "Queued welcome email");
            return Some(Notification::Welcome {
                recipient,
                router: RouterLabel {
                    fingerprint: candidate.fingerprint.clone(),
                    name: candidate.name.clone(),
                },
                exit: candidate.exit,
            });
        }

        let contact = candidate.contact.as_deref().unwrap_or_default();
        if let Err(e) = self
            .unparsable_contacts
            .record_unparsable_contact(candidate.fingerprint.as_str(), contact)
            .await
        {
            tracing::error!(
                fingerprint = %candidate.fingerprint,
                error = %e,
                "Could not record unparsable contact",
            );
        }
        None
    }
}
