//! Subscriber entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use weather_core::model::Subscriber;
use weather_core::types::{DbId, Timestamp};

/// A row from the `subscribers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriberRow {
    pub id: DbId,
    pub email: String,
    pub router_id: DbId,
    pub confirmed: bool,
    pub confirm_auth: String,
    pub unsubs_auth: String,
    pub pref_auth: String,
    pub sub_date: Timestamp,
}

impl From<SubscriberRow> for Subscriber {
    fn from(row: SubscriberRow) -> Self {
        Subscriber {
            id: row.id,
            email: row.email,
            router_id: row.router_id,
            confirmed: row.confirmed,
            confirm_auth: row.confirm_auth,
            unsubs_auth: row.unsubs_auth,
            pref_auth: row.pref_auth,
            sub_date: row.sub_date,
        }
    }
}

/// DTO for creating a subscriber. Authorization tokens are generated by the
/// repository.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriber {
    pub email: String,
    pub router_id: DbId,
    #[serde(default)]
    pub confirmed: bool,
}
