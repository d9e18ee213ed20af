//! Subscription entity models, one row type per kind.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use weather_core::error::CoreError;
use weather_core::model::{BandwidthSub, NodeDownSub, TShirtSub, VersionNotifyType, VersionSub};
use weather_core::types::{DbId, KiloBytesPerSec, Timestamp};

// ---------------------------------------------------------------------------
// node_down_subs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NodeDownSubRow {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub triggered: bool,
    pub grace_pd: i32,
    pub last_changed: Timestamp,
}

impl From<NodeDownSubRow> for NodeDownSub {
    fn from(row: NodeDownSubRow) -> Self {
        NodeDownSub {
            id: row.id,
            subscriber_id: row.subscriber_id,
            emailed: row.emailed,
            triggered: row.triggered,
            grace_pd: row.grace_pd,
            last_changed: row.last_changed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNodeDownSub {
    pub subscriber_id: DbId,
    pub grace_pd: i32,
}

// ---------------------------------------------------------------------------
// version_subs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VersionSubRow {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub notify_type: String,
}

impl TryFrom<VersionSubRow> for VersionSub {
    type Error = CoreError;

    fn try_from(row: VersionSubRow) -> Result<Self, Self::Error> {
        let notify_type = VersionNotifyType::parse(&row.notify_type).ok_or_else(|| {
            CoreError::Validation(format!("unknown notify_type '{}'", row.notify_type))
        })?;
        Ok(VersionSub {
            id: row.id,
            subscriber_id: row.subscriber_id,
            emailed: row.emailed,
            notify_type,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVersionSub {
    pub subscriber_id: DbId,
    pub notify_type: VersionNotifyType,
}

// ---------------------------------------------------------------------------
// bandwidth_subs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BandwidthSubRow {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub threshold: KiloBytesPerSec,
}

impl From<BandwidthSubRow> for BandwidthSub {
    fn from(row: BandwidthSubRow) -> Self {
        BandwidthSub {
            id: row.id,
            subscriber_id: row.subscriber_id,
            emailed: row.emailed,
            threshold: row.threshold,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBandwidthSub {
    pub subscriber_id: DbId,
    pub threshold: KiloBytesPerSec,
}

// ---------------------------------------------------------------------------
// tshirt_subs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TShirtSubRow {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub triggered: bool,
    pub avg_bandwidth: KiloBytesPerSec,
    pub last_changed: Timestamp,
}

impl From<TShirtSubRow> for TShirtSub {
    fn from(row: TShirtSubRow) -> Self {
        TShirtSub {
            id: row.id,
            subscriber_id: row.subscriber_id,
            emailed: row.emailed,
            triggered: row.triggered,
            avg_bandwidth: row.avg_bandwidth,
            last_changed: row.last_changed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTShirtSub {
    pub subscriber_id: DbId,
}
