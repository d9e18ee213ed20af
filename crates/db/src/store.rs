//! [`WeatherStore`] backed by PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use weather_core::error::CoreError;
use weather_core::model::{
    BandwidthSub, NodeDownSub, Router, Subscriber, TShirtSub, VersionSub, Watched,
};
use weather_core::registry::RegistryUpdate;
use weather_core::store::{StoreError, SubscriptionUpdate, WeatherStore};
use weather_core::types::{DbId, Timestamp};

use crate::repositories::{
    BandwidthSubRepo, DeploymentRepo, NodeDownSubRepo, RouterRepo, SubscriberRepo, TShirtSubRepo,
    VersionSubRepo,
};
use crate::DbPool;

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn corrupt(err: CoreError) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// Confirmed subscribers and every router, keyed by id.
struct Owners {
    subscribers: HashMap<DbId, Subscriber>,
    routers: HashMap<DbId, Router>,
}

impl Owners {
    /// Pair a subscription with its subscriber and router. Subscriptions
    /// whose owners disappeared between queries are dropped.
    fn attach<S>(&self, subscription: S, subscriber_id: DbId) -> Option<Watched<S>> {
        let subscriber = self.subscribers.get(&subscriber_id)?;
        let router = self.routers.get(&subscriber.router_id)?;
        Some(Watched {
            subscription,
            subscriber: subscriber.clone(),
            router: router.clone(),
        })
    }
}

#[derive(Clone)]
pub struct PgWeatherStore {
    pool: DbPool,
}

impl PgWeatherStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn owners(&self) -> Result<Owners, StoreError> {
        let subscribers = SubscriberRepo::list_confirmed(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|row| (row.id, Subscriber::from(row)))
            .collect();
        let routers = self
            .list_routers()
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        Ok(Owners {
            subscribers,
            routers,
        })
    }
}

#[async_trait]
impl WeatherStore for PgWeatherStore {
    async fn list_routers(&self) -> Result<Vec<Router>, StoreError> {
        RouterRepo::list(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|row| Router::try_from(row).map_err(corrupt))
            .collect()
    }

    async fn apply_registry(&self, update: &RegistryUpdate) -> Result<(), StoreError> {
        tracing::debug!(
            updated = update.updated.len(),
            created = update.created.len(),
            evicted = update.evicted.len(),
            "Applying registry update",
        );
        RouterRepo::apply_registry(&self.pool, update)
            .await
            .map_err(backend)
    }

    async fn node_down_subs(&self) -> Result<Vec<Watched<NodeDownSub>>, StoreError> {
        let rows = NodeDownSubRepo::list_confirmed(&self.pool)
            .await
            .map_err(backend)?;
        let owners = self.owners().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let subscriber_id = row.subscriber_id;
                owners.attach(NodeDownSub::from(row), subscriber_id)
            })
            .collect())
    }

    async fn version_subs(&self) -> Result<Vec<Watched<VersionSub>>, StoreError> {
        let rows = VersionSubRepo::list_confirmed(&self.pool)
            .await
            .map_err(backend)?;
        let owners = self.owners().await?;
        let mut watched = Vec::with_capacity(rows.len());
        for row in rows {
            let (id, subscriber_id) = (row.id, row.subscriber_id);
            match VersionSub::try_from(row) {
                Ok(sub) => watched.extend(owners.attach(sub, subscriber_id)),
                Err(e) => tracing::warn!(
                    subscription_id = id,
                    error = %e,
                    "Skipping unreadable version subscription",
                ),
            }
        }
        Ok(watched)
    }

    async fn bandwidth_subs(&self) -> Result<Vec<Watched<BandwidthSub>>, StoreError> {
        let rows = BandwidthSubRepo::list_confirmed(&self.pool)
            .await
            .map_err(backend)?;
        let owners = self.owners().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let subscriber_id = row.subscriber_id;
                owners.attach(BandwidthSub::from(row), subscriber_id)
            })
            .collect())
    }

    async fn tshirt_subs(&self) -> Result<Vec<Watched<TShirtSub>>, StoreError> {
        let rows = TShirtSubRepo::list_pending(&self.pool)
            .await
            .map_err(backend)?;
        let owners = self.owners().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let subscriber_id = row.subscriber_id;
                owners.attach(TShirtSub::from(row), subscriber_id)
            })
            .collect())
    }

    async fn save_subscription(&self, update: &SubscriptionUpdate) -> Result<(), StoreError> {
        let (found, entity) = match update {
            SubscriptionUpdate::NodeDown(sub) => (
                NodeDownSubRepo::save(&self.pool, sub).await,
                "node_down_sub",
            ),
            SubscriptionUpdate::Version(sub) => {
                (VersionSubRepo::save(&self.pool, sub).await, "version_sub")
            }
            SubscriptionUpdate::Bandwidth(sub) => (
                BandwidthSubRepo::save(&self.pool, sub).await,
                "bandwidth_sub",
            ),
            SubscriptionUpdate::TShirt(sub) => {
                (TShirtSubRepo::save(&self.pool, sub).await, "tshirt_sub")
            }
        };

        if found.map_err(backend)? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity,
                id: update.id(),
            })
        }
    }

    async fn deployment_time(&self, now: Timestamp) -> Result<Timestamp, StoreError> {
        DeploymentRepo::get_or_init(&self.pool, now)
            .await
            .map_err(backend)
    }
}
