//! Repository for the `version_subs` table.

use sqlx::PgPool;
use weather_core::model::VersionSub;

use crate::models::subscription::{CreateVersionSub, VersionSubRow};

/// Column list for `version_subs` queries.
const COLUMNS: &str = "id, subscriber_id, emailed, notify_type";

/// Provides CRUD operations for version subscriptions.
pub struct VersionSubRepo;

impl VersionSubRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateVersionSub,
    ) -> Result<VersionSubRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO version_subs (subscriber_id, notify_type) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionSubRow>(&query)
            .bind(input.subscriber_id)
            .bind(input.notify_type.as_str())
            .fetch_one(pool)
            .await
    }

    /// List subscriptions whose subscriber is confirmed.
    pub async fn list_confirmed(pool: &PgPool) -> Result<Vec<VersionSubRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM version_subs \
             WHERE subscriber_id IN (SELECT id FROM subscribers WHERE confirmed) \
             ORDER BY id"
        );
        sqlx::query_as::<_, VersionSubRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Returns `true` if the row exists and was updated.
    pub async fn save(pool: &PgPool, sub: &VersionSub) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE version_subs SET emailed = $2 WHERE id = $1")
            .bind(sub.id)
            .bind(sub.emailed)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
