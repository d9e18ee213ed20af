//! Repository for the `routers` table.

use sqlx::PgPool;
use weather_core::registry::RegistryUpdate;
use weather_core::types::DbId;

use crate::models::router::{CreateRouter, RouterRow};

/// Column list for `routers` queries.
const COLUMNS: &str = "id, fingerprint, name, welcomed, last_seen, up, is_exit";

/// Provides CRUD operations for routers.
pub struct RouterRepo;

impl RouterRepo {
    /// List every known router.
    pub async fn list(pool: &PgPool) -> Result<Vec<RouterRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM routers ORDER BY fingerprint");
        sqlx::query_as::<_, RouterRow>(&query).fetch_all(pool).await
    }

    /// Insert a router, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateRouter) -> Result<RouterRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO routers (fingerprint, name, welcomed, last_seen, up, is_exit) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RouterRow>(&query)
            .bind(input.fingerprint.as_str())
            .bind(&input.name)
            .bind(input.welcomed)
            .bind(input.last_seen)
            .bind(input.up)
            .bind(input.exit)
            .fetch_one(pool)
            .await
    }

    /// Apply one pass worth of registry changes in a single transaction.
    pub async fn apply_registry(pool: &PgPool, update: &RegistryUpdate) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        for router in &update.updated {
            sqlx::query(
                "UPDATE routers \
                 SET name = $2, welcomed = $3, last_seen = $4, up = $5, is_exit = $6 \
                 WHERE id = $1",
            )
            .bind(router.id)
            .bind(&router.name)
            .bind(router.welcomed)
            .bind(router.last_seen)
            .bind(router.up)
            .bind(router.exit)
            .execute(&mut *tx)
            .await?;
        }

        for router in &update.created {
            sqlx::query(
                "INSERT INTO routers (fingerprint, name, welcomed, last_seen, up, is_exit) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (fingerprint) DO UPDATE \
                 SET name = EXCLUDED.name, last_seen = EXCLUDED.last_seen, \
                     up = EXCLUDED.up, is_exit = EXCLUDED.is_exit",
            )
            .bind(router.fingerprint.as_str())
            .bind(&router.name)
            .bind(router.welcomed)
            .bind(router.last_seen)
            .bind(router.up)
            .bind(router.exit)
            .execute(&mut *tx)
            .await?;
        }

        if !update.evicted.is_empty() {
            sqlx::query("DELETE FROM routers WHERE id = ANY($1)")
                .bind(update.evicted.as_slice())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }

    /// Delete a router and, by cascade, its subscribers.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM routers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
