//! Repository for the `tshirt_subs` table.

use sqlx::PgPool;
use weather_core::model::TShirtSub;

use crate::models::subscription::{CreateTShirtSub, TShirtSubRow};

/// Column list for `tshirt_subs` queries.
const COLUMNS: &str = "id, subscriber_id, emailed, triggered, avg_bandwidth, last_changed";

/// Provides CRUD operations for T-shirt subscriptions.
pub struct TShirtSubRepo;

impl TShirtSubRepo {
    pub async fn create(pool: &PgPool, input: &CreateTShirtSub) -> Result<TShirtSubRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tshirt_subs (subscriber_id) \
             VALUES ($1) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TShirtSubRow>(&query)
            .bind(input.subscriber_id)
            .fetch_one(pool)
            .await
    }

    /// List not-yet-emailed subscriptions whose subscriber is confirmed.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<TShirtSubRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tshirt_subs \
             WHERE emailed = false \
               AND subscriber_id IN (SELECT id FROM subscribers WHERE confirmed) \
             ORDER BY id"
        );
        sqlx::query_as::<_, TShirtSubRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Returns `true` if the row exists and was updated.
    pub async fn save(pool: &PgPool, sub: &TShirtSub) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tshirt_subs \
             SET emailed = $2, triggered = $3, avg_bandwidth = $4, last_changed = $5 \
             WHERE id = $1",
        )
        .bind(sub.id)
        .bind(sub.emailed)
        .bind(sub.triggered)
        .bind(sub.avg_bandwidth)
        .bind(sub.last_changed)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
