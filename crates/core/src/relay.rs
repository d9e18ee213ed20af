//! Point-in-time relay facts as consumed by the monitoring engine.
//!
//! A [`SnapshotSet`] is what one pass sees of the network: a status record
//! per fingerprint plus the list of currently recommended versions. Relay
//! sources build it once per pass; the registry updater and the subscription
//! checks only ever read from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::types::KiloBytesPerSec;

/// Directory flag carried by relays with long, reliable uptime.
pub const FLAG_STABLE: &str = "Stable";

/// Directory flag carried by relays listed in the current consensus.
pub const FLAG_RUNNING: &str = "Running";

// ---------------------------------------------------------------------------
// RelayStatus
// ---------------------------------------------------------------------------

/// Observable status of one relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub fingerprint: Fingerprint,
    pub nickname: String,
    /// Listed as running in the latest consensus.
    pub up: bool,
    pub hibernating: bool,
    /// Accepts exit traffic on port 80.
    pub is_exit: bool,
    pub observed_bandwidth_kbs: KiloBytesPerSec,
    /// `None` when the relay's version could not be determined.
    pub version: Option<String>,
    pub contact: Option<String>,
    pub flags: Vec<String>,
}

impl RelayStatus {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    pub fn has_stable_flag(&self) -> bool {
        self.has_flag(FLAG_STABLE)
    }
}

/// A `(fingerprint, name)` pair as listed by the relay source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayListing {
    pub fingerprint: Fingerprint,
    pub name: String,
}

/// Selection criteria for [`SnapshotSet::listings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayFilter {
    /// Only relays whose running state matches.
    pub running: Option<bool>,
    /// Only relays carrying this directory flag.
    pub flag: Option<String>,
}

impl RelayFilter {
    /// Relays currently running.
    pub fn running() -> Self {
        Self {
            running: Some(true),
            flag: None,
        }
    }

    /// Restrict to relays carrying `flag`.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn matches(&self, status: &RelayStatus) -> bool {
        self.running.is_none_or(|running| status.up == running)
            && self.flag.as_deref().is_none_or(|flag| status.has_flag(flag))
    }
}

// ---------------------------------------------------------------------------
// SnapshotSet
// ---------------------------------------------------------------------------

/// Structural problems with a snapshot set. Any of these aborts a pass
/// before state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Inconsistent relay counts across documents: {0}")]
    Inconsistent(String),
}

/// Everything one pass knows about the network.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    relays: HashMap<Fingerprint, RelayStatus>,
    recommended_versions: Vec<String>,
}

impl SnapshotSet {
    /// Build a set from relay statuses. A later duplicate fingerprint
    /// replaces an earlier one.
    pub fn new(
        relays: impl IntoIterator<Item = RelayStatus>,
        recommended_versions: Vec<String>,
    ) -> Self {
        Self {
            relays: relays
                .into_iter()
                .map(|r| (r.fingerprint.clone(), r))
                .collect(),
            recommended_versions,
        }
    }

    /// Status of one relay, or `None` when the source does not know it.
    pub fn snapshot(&self, fingerprint: &Fingerprint) -> Option<&RelayStatus> {
        self.relays.get(fingerprint)
    }

    /// `(fingerprint, name)` pairs for relays matching `filter`, sorted by
    /// fingerprint so passes are deterministic.
    pub fn listings(&self, filter: &RelayFilter) -> Vec<RelayListing> {
        let mut listings: Vec<RelayListing> = self
            .relays
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| RelayListing {
                fingerprint: r.fingerprint.clone(),
                name: r.nickname.clone(),
            })
            .collect();
        listings.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
        listings
    }

    /// Currently recommended versions, ascending.
    pub fn recommended_versions(&self) -> &[String] {
        &self.recommended_versions
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }
}

/// Reject a snapshot whose per-document relay counts disagree.
///
/// `counts` pairs a document label with the number of relays it reported.
pub fn validate_counts(counts: &[(&str, usize)]) -> Result<(), SnapshotError> {
    let Some((_, first)) = counts.first() else {
        return Ok(());
    };
    if counts.iter().all(|(_, n)| n == first) {
        return Ok(());
    }
    let detail = counts
        .iter()
        .map(|(label, n)| format!("{label}={n}"))
        .collect::<Vec<_>>()
        .join(", ");
    Err(SnapshotError::Inconsistent(detail))
}
