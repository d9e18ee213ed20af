//! Exit-policy summary evaluation.
//!
//! The relay directory condenses each relay's IPv4 exit policy into either an
//! `accept` or a `reject` list of ports and port ranges. A relay counts as an
//! exit for notification purposes when it lets traffic out on port 80.

use serde::{Deserialize, Serialize};

/// The web port that decides whether a relay is an exit.
pub const HTTP_PORT: u16 = 80;

/// Condensed exit policy as published by the relay directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPolicySummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject: Option<Vec<String>>,
}

impl ExitPolicySummary {
    /// Whether traffic to `port` is allowed to leave through this relay.
    pub fn allows_port(&self, port: u16) -> bool {
        if let Some(accept) = &self.accept {
            return list_covers(accept, port);
        }
        if let Some(reject) = &self.reject {
            return !list_covers(reject, port);
        }
        false
    }

    pub fn is_exit(&self) -> bool {
        self.allows_port(HTTP_PORT)
    }
}

/// Whether `port` appears in a list of `"N"` and `"A-B"` entries.
///
/// Malformed entries are ignored.
fn list_covers(entries: &[String], port: u16) -> bool {
    entries.iter().any(|entry| match entry.split_once('-') {
        Some((lo, hi)) => match (lo.trim().parse::<u16>(), hi.trim().parse::<u16>()) {
            (Ok(lo), Ok(hi)) => (lo..=hi).contains(&port),
            _ => false,
        },
        None => entry.trim().parse::<u16>().is_ok_and(|p| p == port),
    })
}
