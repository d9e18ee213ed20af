//! Repository for the `bandwidth_subs` table.

use sqlx::PgPool;
use weather_core::model::BandwidthSub;

use crate::models::subscription::{BandwidthSubRow, CreateBandwidthSub};

/// Column list for `bandwidth_subs` queries.
const COLUMNS: &str = "id, subscriber_id, emailed, threshold";

/// Provides CRUD operations for low-bandwidth subscriptions.
pub struct BandwidthSubRepo;

impl BandwidthSubRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateBandwidthSub,
    ) -> Result<BandwidthSubRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO bandwidth_subs (subscriber_id, threshold) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BandwidthSubRow>(&query)
            .bind(input.subscriber_id)
            .bind(input.threshold)
            .fetch_one(pool)
            .await
    }

    /// List subscriptions whose subscriber is confirmed.
    pub async fn list_confirmed(pool: &PgPool) -> Result<Vec<BandwidthSubRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bandwidth_subs \
             WHERE subscriber_id IN (SELECT id FROM subscribers WHERE confirmed) \
             ORDER BY id"
        );
        sqlx::query_as::<_, BandwidthSubRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Returns `true` if the row exists and was updated.
    pub async fn save(pool: &PgPool, sub: &BandwidthSub) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE bandwidth_subs SET emailed = $2 WHERE id = $1")
            .bind(sub.id)
            .bind(sub.emailed)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
