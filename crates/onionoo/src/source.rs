//! [`RelaySource`] backed by Onionoo.

use async_trait::async_trait;
use weather_core::fingerprint::Fingerprint;
use weather_core::relay::{validate_counts, RelayStatus, SnapshotSet};
use weather_core::source::{RelaySource, SourceError};
use weather_core::version::{sort_versions, TorVersion};

use crate::client::{OnionooClient, OnionooError};
use crate::documents::{DetailsDocument, RelayDetails, SummaryDocument};
use crate::query::OnionooQuery;

/// Observed bandwidth is published in bytes per second.
const BYTES_PER_KB: i64 = 1000;

pub struct OnionooSource {
    client: OnionooClient,
}

impl OnionooSource {
    pub fn new(client: OnionooClient) -> Self {
        Self { client }
    }
}

impl From<OnionooError> for SourceError {
    fn from(err: OnionooError) -> Self {
        match err {
            OnionooError::Decode { .. } => SourceError::Decode(err.to_string()),
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl RelaySource for OnionooSource {
    async fn fetch(&self) -> Result<SnapshotSet, SourceError> {
        let details = self.client.details(&OnionooQuery::relays()).await?;
        let summary = self
            .client
            .summary(&OnionooQuery::relays().running(true))
            .await?;
        build_snapshot_set(&details, &summary)
    }
}

/// Combine a details document for all relays with a summary of running
/// relays. Disagreeing running counts reject the whole set.
pub fn build_snapshot_set(
    details: &DetailsDocument,
    summary: &SummaryDocument,
) -> Result<SnapshotSet, SourceError> {
    validate_counts(&[
        ("details", details.running_count()),
        ("summary", summary.running_count()),
    ])?;

    let mut recommended = Vec::new();
    let mut relays = Vec::with_capacity(details.relays.len());

    for relay in &details.relays {
        let Some(status) = to_status(relay) else {
            continue;
        };
        if relay.recommended_version == Some(true) {
            recommended.extend(status.version.clone());
        }
        relays.push(status);
    }

    tracing::debug!(
        relays = relays.len(),
        running = summary.running_count(),
        recommended = recommended.len(),
        "Built snapshot set from Onionoo",
    );

    Ok(SnapshotSet::new(relays, sort_versions(recommended)))
}

fn to_status(relay: &RelayDetails) -> Option<RelayStatus> {
    let fingerprint = match Fingerprint::parse(&relay.fingerprint) {
        Ok(fp) => fp,
        Err(e) => {
            tracing::warn!(fingerprint = %relay.fingerprint, error = %e, "Dropping relay with malformed fingerprint");
            return None;
        }
    };

    let version = relay
        .version
        .clone()
        .filter(|v| TorVersion::parse(v).is_some())
        .or_else(|| relay.platform.as_deref().and_then(TorVersion::from_platform));

    Some(RelayStatus {
        fingerprint,
        nickname: relay
            .nickname
            .clone()
            .unwrap_or_else(|| weather_core::model::UNNAMED.to_string()),
        up: relay.running,
        hibernating: relay.hibernating.unwrap_or(false),
        is_exit: relay
            .exit_policy_summary
            .as_ref()
            .is_some_and(|p| p.is_exit()),
        observed_bandwidth_kbs: relay.observed_bandwidth.unwrap_or(0).max(0) / BYTES_PER_KB,
        version,
        contact: relay.contact.clone(),
        flags: relay.flags.clone(),
    })
}
