//! Repository for the `node_down_subs` table.

use sqlx::PgPool;
use weather_core::model::NodeDownSub;

use crate::models::subscription::{CreateNodeDownSub, NodeDownSubRow};

/// Column list for `node_down_subs` queries.
const COLUMNS: &str = "id, subscriber_id, emailed, triggered, grace_pd, last_changed";

/// Provides CRUD operations for node-down subscriptions.
pub struct NodeDownSubRepo;

impl NodeDownSubRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateNodeDownSub,
    ) -> Result<NodeDownSubRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO node_down_subs (subscriber_id, grace_pd) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NodeDownSubRow>(&query)
            .bind(input.subscriber_id)
            .bind(input.grace_pd)
            .fetch_one(pool)
            .await
    }

    /// List subscriptions whose subscriber is confirmed.
    pub async fn list_confirmed(pool: &PgPool) -> Result<Vec<NodeDownSubRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM node_down_subs \
             WHERE subscriber_id IN (SELECT id FROM subscribers WHERE confirmed) \
             ORDER BY id"
        );
        sqlx::query_as::<_, NodeDownSubRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Persist the monitoring state of one subscription. `grace_pd` is a
    /// subscriber preference and is left as stored.
    ///
    /// Returns `true` if the row exists and was updated.
    pub async fn save(pool: &PgPool, sub: &NodeDownSub) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE node_down_subs \
             SET emailed = $2, triggered = $3, last_changed = $4 \
             WHERE id = $1",
        )
        .bind(sub.id)
        .bind(sub.emailed)
        .bind(sub.triggered)
        .bind(sub.last_changed)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
