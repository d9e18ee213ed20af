//! Deployment marker model.

use sqlx::FromRow;
use weather_core::types::Timestamp;

/// The single row of the `deployment` table.
#[derive(Debug, Clone, FromRow)]
pub struct Deployment {
    pub deployed_at: Timestamp,
}
