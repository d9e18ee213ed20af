//! Subscription evaluation for one pass.
//!
//! Runs after the registry update, so every [`Watched`] router already
//! carries this pass's `up`/`exit`/`last_seen` values. Per-relay facts the
//! router row does not hold (hibernation, version, observed bandwidth) come
//! from the pass's [`SnapshotSet`].
//!
//! A changed subscription is saved on its own; its notification is queued
//! only once that save succeeds. A failed save is logged and the
//! subscription is evaluated again next pass. A kind whose listing fails is
//! skipped for this pass; the other kinds and every notice already queued
//! go ahead.

use std::collections::HashMap;

use weather_core::model::{Router, Watched};
use weather_core::notice::{Notification, NoticeKind};
use weather_core::relay::{RelayStatus, SnapshotSet};
use weather_core::store::{StoreError, SubscriptionUpdate, WeatherStore};
use weather_core::subscription::node_down::NodeState;
use weather_core::subscription::tshirt::UptimeSample;
use weather_core::subscription::{
    low_bandwidth, node_down, tshirt, version_watch, Evaluation, Transition,
};
use weather_core::types::Timestamp;

/// Tally for one subscription kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTally {
    pub evaluated: usize,
    pub saved: usize,
    pub skipped: usize,
    pub save_failures: usize,
    pub listing_failures: usize,
    pub notified: usize,
}

/// What the checks produced.
#[derive(Debug, Default)]
pub struct CheckOutcome {
    pub notifications: Vec<Notification>,
    pub tallies: HashMap<NoticeKind, KindTally>,
}

impl CheckOutcome {
    pub fn tally(&self, kind: NoticeKind) -> KindTally {
        self.tallies.get(&kind).copied().unwrap_or_default()
    }
}

pub struct SubscriptionChecks<'a> {
    store: &'a dyn WeatherStore,
    snapshots: &'a SnapshotSet,
    now: Timestamp,
}

impl<'a> SubscriptionChecks<'a> {
    pub fn new(store: &'a dyn WeatherStore, snapshots: &'a SnapshotSet, now: Timestamp) -> Self {
        Self {
            store,
            snapshots,
            now,
        }
    }

    /// Evaluate every confirmed subscription of every kind.
    pub async fn run(&self) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();

        let listing = self.store.node_down_subs().await;
        for watched in listed(NoticeKind::NodeDown, listing, &mut outcome) {
            let node = NodeState {
                up: watched.router.up,
                hibernating: self.status(&watched.router).is_some_and(|s| s.hibernating),
            };
            let transition = node_down::evaluate(&watched.subscription, node, self.now);
            self.commit(
                &watched,
                NoticeKind::NodeDown,
                Evaluation::Evaluated(transition),
                SubscriptionUpdate::NodeDown,
                &mut outcome,
            )
            .await;
        }

        let listing = self.store.version_subs().await;
        for watched in listed(NoticeKind::Version, listing, &mut outcome) {
            let version = self
                .status(&watched.router)
                .and_then(|s| s.version.as_deref());
            let evaluation = version_watch::evaluate(
                &watched.subscription,
                version,
                self.snapshots.recommended_versions(),
            );
            self.commit(
                &watched,
                NoticeKind::Version,
                evaluation,
                SubscriptionUpdate::Version,
                &mut outcome,
            )
            .await;
        }

        let listing = self.store.bandwidth_subs().await;
        for watched in listed(NoticeKind::Bandwidth, listing, &mut outcome) {
            // A relay the source does not know carries no traffic.
            let observed = self
                .status(&watched.router)
                .map_or(0, |s| s.observed_bandwidth_kbs);
            let transition = low_bandwidth::evaluate(&watched.subscription, observed);
            self.commit(
                &watched,
                NoticeKind::Bandwidth,
                Evaluation::Evaluated(transition),
                SubscriptionUpdate::Bandwidth,
                &mut outcome,
            )
            .await;
        }

        let listing = self.store.tshirt_subs().await;
        for watched in listed(NoticeKind::TShirt, listing, &mut outcome) {
            let router = &watched.router;
            let sample = UptimeSample {
                up: router.up,
                exit: router.exit,
                observed: self.status(router).map_or(0, |s| s.observed_bandwidth_kbs),
            };
            let transition = tshirt::evaluate(&watched.subscription, sample, self.now);
            self.commit(
                &watched,
                NoticeKind::TShirt,
                Evaluation::Evaluated(transition),
                SubscriptionUpdate::TShirt,
                &mut outcome,
            )
            .await;
        }

        for kind in [
            NoticeKind::NodeDown,
            NoticeKind::Version,
            NoticeKind::Bandwidth,
            NoticeKind::TShirt,
        ] {
            let tally = outcome.tally(kind);
            tracing::info!(
                kind = kind.as_str(),
                evaluated = tally.evaluated,
                saved = tally.saved,
                skipped = tally.skipped,
                save_failures = tally.save_failures,
                listing_failures = tally.listing_failures,
                notified = tally.notified,
                "Subscriptions checked",
            );
        }

        outcome
    }

    fn status(&self, router: &Router) -> Option<&'a RelayStatus> {
        self.snapshots.snapshot(&router.fingerprint)
    }

    /// Persist a changed subscription and queue its notice.
    async fn commit<S>(
        &self,
        watched: &Watched<S>,
        kind: NoticeKind,
        evaluation: Evaluation<S>,
        wrap: fn(S) -> SubscriptionUpdate,
        outcome: &mut CheckOutcome,
    ) where
        S: Clone + PartialEq + Send + Sync,
    {
        let tally = outcome.tallies.entry(kind).or_default();
        tally.evaluated += 1;

        let transition = match evaluation {
            Evaluation::Evaluated(transition) => transition,
            Evaluation::Skipped(reason) => {
                tally.skipped += 1;
                tracing::info!(
                    kind = kind.as_str(),
                    fingerprint = %watched.router.fingerprint,
                    reason = reason.as_str(),
                    "Skipping subscription this pass",
                );
                return;
            }
        };

        if !transition.is_change(&watched.subscription) {
            return;
        }

        let Transition { next, notice } = transition;
        let update = wrap(next);
        if let Err(e) = self.store.save_subscription(&update).await {
            let tally = outcome.tallies.entry(kind).or_default();
            tally.save_failures += 1;
            tracing::warn!(
                kind = kind.as_str(),
                subscription_id = update.id(),
                error = %e,
                "Failed to save subscription, dropping its notice",
            );
            return;
        }

        let tally = outcome.tallies.entry(kind).or_default();
        tally.saved += 1;
        if let Some(notice) = notice {
            tally.notified += 1;
            tracing::debug!(
                kind = kind.as_str(),
                fingerprint = %watched.router.fingerprint,
                subscriber_id = watched.subscriber.id,
                "Queued notification",
            );
            outcome.notifications.push(Notification::for_subscriber(
                &watched.subscriber,
                &watched.router,
                notice,
            ));
        }
    }
}

/// Unwrap one kind's listing. A failed listing is logged and yields nothing.
fn listed<S>(
    kind: NoticeKind,
    listing: Result<Vec<S>, StoreError>,
    outcome: &mut CheckOutcome,
) -> Vec<S> {
    listing.unwrap_or_else(|e| {
        outcome.tallies.entry(kind).or_default().listing_failures += 1;
        tracing::error!(
            kind = kind.as_str(),
            error = %e,
            "Failed to list subscriptions, skipping this kind",
        );
        Vec::new()
    })
}
