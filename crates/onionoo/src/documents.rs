//! Typed Onionoo response documents.
//!
//! Only the fields the monitoring engine reads are modelled; everything is
//! optional except the relay lists, since Onionoo omits fields it has no
//! value for.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use weather_core::exit_policy::ExitPolicySummary;

/// Timestamp format used throughout Onionoo documents.
pub const ONIONOO_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_onionoo_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, ONIONOO_TIME_FORMAT).ok()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryDocument {
    #[serde(default)]
    pub relays_published: Option<String>,
    #[serde(default)]
    pub relays: Vec<RelaySummary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelaySummary {
    /// Nickname.
    #[serde(rename = "n", default)]
    pub nickname: Option<String>,
    /// Fingerprint.
    #[serde(rename = "f")]
    pub fingerprint: String,
    /// Running in the latest consensus.
    #[serde(rename = "r", default)]
    pub running: bool,
}

impl SummaryDocument {
    pub fn running_count(&self) -> usize {
        self.relays.iter().filter(|r| r.running).count()
    }
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetailsDocument {
    #[serde(default)]
    pub relays_published: Option<String>,
    #[serde(default)]
    pub relays: Vec<RelayDetails>,
}

impl DetailsDocument {
    pub fn running_count(&self) -> usize {
        self.relays.iter().filter(|r| r.running).count()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayDetails {
    #[serde(default)]
    pub nickname: Option<String>,
    pub fingerprint: String,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub hibernating: Option<bool>,
    #[serde(default)]
    pub flags: Vec<String>,
    /// Bytes per second.
    #[serde(default)]
    pub observed_bandwidth: Option<i64>,
    #[serde(default)]
    pub exit_policy_summary: Option<ExitPolicySummary>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub recommended_version: Option<bool>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub first_seen: Option<String>,
}

impl RelayDetails {
    pub fn last_seen_at(&self) -> Option<NaiveDateTime> {
        self.last_seen.as_deref().and_then(parse_onionoo_time)
    }

    pub fn first_seen_at(&self) -> Option<NaiveDateTime> {
        self.first_seen.as_deref().and_then(parse_onionoo_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_short_field_names() {
        let doc: SummaryDocument = serde_json::from_str(
            r#"{"relays_published":"2024-06-01 12:00:00",
                "relays":[{"n":"moria1","f":"9695DFC35FFEB861329B9F1AB04C46397020CE31","a":["128.31.0.34"],"r":true},
                          {"f":"847B1F850344D7876491A54892F904934E4EB85D","r":false}],
                "bridges":[]}"#,
        )
        .unwrap();
        assert_eq!(doc.relays.len(), 2);
        assert_eq!(doc.relays[0].nickname.as_deref(), Some("moria1"));
        assert!(doc.relays[1].nickname.is_none());
        assert_eq!(doc.running_count(), 1);
    }

    #[test]
    fn details_missing_fields_are_none() {
        let doc: DetailsDocument = serde_json::from_str(
            r#"{"relays":[{"fingerprint":"9695DFC35FFEB861329B9F1AB04C46397020CE31","running":true}]}"#,
        )
        .unwrap();
        let relay = &doc.relays[0];
        assert!(relay.running);
        assert!(relay.hibernating.is_none());
        assert!(relay.flags.is_empty());
        assert!(relay.exit_policy_summary.is_none());
        assert!(relay.version.is_none());
    }

    #[test]
    fn details_full_relay() {
        let doc: DetailsDocument = serde_json::from_str(
            r#"{"relays":[{
                "nickname":"moria1",
                "fingerprint":"9695DFC35FFEB861329B9F1AB04C46397020CE31",
                "running":true,
                "hibernating":false,
                "flags":["Fast","Running","Stable"],
                "observed_bandwidth":512000,
                "exit_policy_summary":{"reject":["1-65535"]},
                "contact":"1024D/28988BF5 arma mit edu",
                "platform":"Tor 0.2.4.23 on Linux",
                "recommended_version":true,
                "last_seen":"2024-06-01 11:00:00",
                "first_seen":"2009-01-01 00:00:00"
            }]}"#,
        )
        .unwrap();
        let relay = &doc.relays[0];
        assert_eq!(relay.observed_bandwidth, Some(512_000));
        assert_eq!(relay.recommended_version, Some(true));
        assert!(!relay.exit_policy_summary.as_ref().unwrap().is_exit());
        assert_eq!(
            relay.last_seen_at().unwrap().to_string(),
            "2024-06-01 11:00:00"
        );
    }
}
