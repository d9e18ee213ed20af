//! Persisted domain records: routers, subscribers and the four subscription
//! kinds.
//!
//! These are storage-agnostic; `weather-db` maps its rows into them.

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::types::{DbId, KiloBytesPerSec, Timestamp};

/// Name the directory assigns to relays that never set a nickname.
pub const UNNAMED: &str = "Unnamed";

// ---------------------------------------------------------------------------
// Router / Subscriber
// ---------------------------------------------------------------------------

/// A relay known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub id: DbId,
    pub fingerprint: Fingerprint,
    pub name: String,
    pub welcomed: bool,
    pub last_seen: Timestamp,
    pub up: bool,
    /// Accepts exit traffic on port 80.
    pub exit: bool,
}

impl Router {
    /// Email-friendly label, e.g. `"moria1 (id: 9695 DFC3 ...)"`.
    pub fn display_name(&self) -> String {
        display_name(&self.name, &self.fingerprint)
    }
}

/// Render a router label from its name and fingerprint. Unnamed relays are
/// shown by fingerprint only.
pub fn display_name(name: &str, fingerprint: &Fingerprint) -> String {
    if name.is_empty() || name == UNNAMED {
        format!("(id: {})", fingerprint.spaced())
    } else {
        format!("{name} (id: {})", fingerprint.spaced())
    }
}

/// An email address watching one router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: DbId,
    pub email: String,
    pub router_id: DbId,
    pub confirmed: bool,
    pub confirm_auth: String,
    pub unsubs_auth: String,
    pub pref_auth: String,
    pub sub_date: Timestamp,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Alert when the router has been unreachable for `grace_pd` hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDownSub {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub triggered: bool,
    /// Grace period in hours.
    pub grace_pd: i32,
    pub last_changed: Timestamp,
}

/// Which version condition a [`VersionSub`] reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionNotifyType {
    Obsolete,
}

impl VersionNotifyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Obsolete => "OBSOLETE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OBSOLETE" => Some(Self::Obsolete),
            _ => None,
        }
    }
}

/// Alert when the router runs a version the authorities no longer recommend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSub {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub notify_type: VersionNotifyType,
}

/// Alert when observed bandwidth drops below `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthSub {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub threshold: KiloBytesPerSec,
}

/// Tracks an uptime episode towards T-shirt eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TShirtSub {
    pub id: DbId,
    pub subscriber_id: DbId,
    pub emailed: bool,
    pub triggered: bool,
    pub avg_bandwidth: KiloBytesPerSec,
    pub last_changed: Timestamp,
}

/// A subscription loaded together with its subscriber and router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watched<S> {
    pub subscription: S,
    pub subscriber: Subscriber,
    pub router: Router,
}
