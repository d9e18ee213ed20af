//! Router registry reconciliation.
//!
//! [`reconcile`] compares the known routers with the relays the source lists
//! as running and produces a [`RegistryUpdate`] that the store applies in one
//! transaction. Routers that are not listed are marked down but otherwise
//! left alone; only the staleness rule removes them.

use std::collections::HashMap;

use chrono::Duration;

use crate::contact::deobfuscate_email;
use crate::fingerprint::Fingerprint;
use crate::model::Router;
use crate::relay::{RelayFilter, SnapshotSet};
use crate::types::{DbId, Timestamp};

/// Routers unseen for longer than this are deleted.
pub fn eviction_age() -> Duration {
    Duration::days(365)
}

/// Relays first observed this soon after deployment are assumed to predate
/// it and are not welcomed.
pub fn deployment_grace() -> Duration {
    Duration::hours(48)
}

/// Inputs that stay fixed for one pass.
#[derive(Debug, Clone, Copy)]
pub struct RegistryContext {
    pub now: Timestamp,
    pub deployment_time: Timestamp,
}

impl RegistryContext {
    pub fn within_deployment_grace(&self) -> bool {
        self.now - self.deployment_time < deployment_grace()
    }
}

/// A router seen for the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRouter {
    pub fingerprint: Fingerprint,
    pub name: String,
    pub welcomed: bool,
    pub last_seen: Timestamp,
    pub up: bool,
    pub exit: bool,
}

/// A stable relay whose operator has not yet been welcomed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeCandidate {
    pub fingerprint: Fingerprint,
    pub name: String,
    pub exit: bool,
    pub contact: Option<String>,
}

impl WelcomeCandidate {
    /// Operator address parsed from the contact line, if any.
    pub fn recipient(&self) -> Option<String> {
        self.contact.as_deref().and_then(deobfuscate_email)
    }
}

/// Changes to apply to the router table for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryUpdate {
    /// Known routers with refreshed fields, including those now marked down.
    pub updated: Vec<Router>,
    pub created: Vec<NewRouter>,
    pub evicted: Vec<DbId>,
    pub welcomes: Vec<WelcomeCandidate>,
}

impl RegistryUpdate {
    pub fn listed_count(&self) -> usize {
        self.created.len() + self.updated.iter().filter(|r| r.up).count()
    }
}

/// Reconcile `known` routers with the running relays in `snapshots`.
pub fn reconcile(known: &[Router], snapshots: &SnapshotSet, ctx: RegistryContext) -> RegistryUpdate {
    let mut update = RegistryUpdate::default();
    let mut by_fingerprint: HashMap<&Fingerprint, Router> = known
        .iter()
        .map(|r| {
            let mut router = r.clone();
            router.up = false;
            (&r.fingerprint, router)
        })
        .collect();

    let prewelcomed = ctx.within_deployment_grace();

    for listing in snapshots.listings(&RelayFilter::running()) {
        let Some(status) = snapshots.snapshot(&listing.fingerprint) else {
            continue;
        };

        let welcomed = match by_fingerprint.get_mut(&listing.fingerprint) {
            Some(router) => {
                router.name = listing.name.clone();
                router.last_seen = ctx.now;
                router.up = true;
                router.exit = status.is_exit;
                &mut router.welcomed
            }
            None => {
                update.created.push(NewRouter {
                    fingerprint: listing.fingerprint.clone(),
                    name: listing.name.clone(),
                    welcomed: prewelcomed,
                    last_seen: ctx.now,
                    up: true,
                    exit: status.is_exit,
                });
                let created = update.created.len() - 1;
                &mut update.created[created].welcomed
            }
        };

        if !*welcomed && status.has_stable_flag() {
            // One-shot: marked even if no address can be parsed.
            *welcomed = true;
            update.welcomes.push(WelcomeCandidate {
                fingerprint: listing.fingerprint.clone(),
                name: listing.name.clone(),
                exit: status.is_exit,
                contact: status.contact.clone(),
            });
        }
    }

    for router in known {
        let Some(next) = by_fingerprint.remove(&router.fingerprint) else {
            continue;
        };
        if ctx.now - next.last_seen > eviction_age() {
            update.evicted.push(next.id);
        } else if next != *router {
            update.updated.push(next);
        }
    }

    update
}
