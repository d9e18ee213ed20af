//! Persistence seam used by the run coordinator.

use async_trait::async_trait;

use crate::model::{BandwidthSub, NodeDownSub, Router, TShirtSub, VersionSub, Watched};
use crate::registry::RegistryUpdate;
use crate::types::{DbId, Timestamp};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Stored data is invalid: {0}")]
    Corrupt(String),
}

/// A changed subscription to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionUpdate {
    NodeDown(NodeDownSub),
    Version(VersionSub),
    Bandwidth(BandwidthSub),
    TShirt(TShirtSub),
}

impl SubscriptionUpdate {
    pub fn id(&self) -> DbId {
        match self {
            Self::NodeDown(s) => s.id,
            Self::Version(s) => s.id,
            Self::Bandwidth(s) => s.id,
            Self::TShirt(s) => s.id,
        }
    }
}

/// Routers and subscriptions as seen by the monitoring engine.
///
/// Subscription listings only include confirmed subscribers.
#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn list_routers(&self) -> Result<Vec<Router>, StoreError>;

    /// Apply a registry update atomically.
    async fn apply_registry(&self, update: &RegistryUpdate) -> Result<(), StoreError>;

    async fn node_down_subs(&self) -> Result<Vec<Watched<NodeDownSub>>, StoreError>;

    async fn version_subs(&self) -> Result<Vec<Watched<VersionSub>>, StoreError>;

    async fn bandwidth_subs(&self) -> Result<Vec<Watched<BandwidthSub>>, StoreError>;

    /// Only subscriptions that have not yet been emailed.
    async fn tshirt_subs(&self) -> Result<Vec<Watched<TShirtSub>>, StoreError>;

    /// Persist one subscription row.
    async fn save_subscription(&self, update: &SubscriptionUpdate) -> Result<(), StoreError>;

    /// The recorded deployment time, recording `now` on first call.
    async fn deployment_time(&self, now: Timestamp) -> Result<Timestamp, StoreError>;
}
