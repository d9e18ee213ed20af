//! Repository for the single-row `deployment` table.

use sqlx::PgPool;
use weather_core::types::Timestamp;

use crate::models::deployment::Deployment;

pub struct DeploymentRepo;

impl DeploymentRepo {
    /// Return the recorded deployment time, recording `now` if the table is
    /// still empty.
    pub async fn get_or_init(pool: &PgPool, now: Timestamp) -> Result<Timestamp, sqlx::Error> {
        sqlx::query(
            "INSERT INTO deployment (id, deployed_at) VALUES (1, $1) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(now)
        .execute(pool)
        .await?;

        let row = sqlx::query_as::<_, Deployment>("SELECT deployed_at FROM deployment WHERE id = 1")
            .fetch_one(pool)
            .await?;
        Ok(row.deployed_at)
    }
}
