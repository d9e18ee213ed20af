//! Router entity model.

use serde::Serialize;
use sqlx::FromRow;
use weather_core::error::CoreError;
use weather_core::fingerprint::Fingerprint;
use weather_core::model::Router;
use weather_core::types::{DbId, Timestamp};

/// A row from the `routers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RouterRow {
    pub id: DbId,
    pub fingerprint: String,
    pub name: String,
    pub welcomed: bool,
    pub last_seen: Timestamp,
    pub up: bool,
    pub is_exit: bool,
}

impl TryFrom<RouterRow> for Router {
    type Error = CoreError;

    fn try_from(row: RouterRow) -> Result<Self, Self::Error> {
        Ok(Router {
            id: row.id,
            fingerprint: Fingerprint::parse(&row.fingerprint)?,
            name: row.name,
            welcomed: row.welcomed,
            last_seen: row.last_seen,
            up: row.up,
            exit: row.is_exit,
        })
    }
}

/// DTO for inserting a router outside a registry pass.
#[derive(Debug, Clone)]
pub struct CreateRouter {
    pub fingerprint: Fingerprint,
    pub name: String,
    pub welcomed: bool,
    pub last_seen: Timestamp,
    pub up: bool,
    pub exit: bool,
}
