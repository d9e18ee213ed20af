//! Tor version parsing, ordering, and recommendation classification.
//!
//! Versions follow `MAJOR.MINOR.MICRO[.PATCH][-STATUS][ (EXTRA)]`. Numeric
//! components compare left to right with a missing patch treated as 0. When
//! the numbers are equal, a tagged version (`-dev`, `-alpha`, `-rc`) sorts
//! below the bare release and tags compare lexically among themselves.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Status tag carried by development builds.
pub const DEV_STATUS: &str = "dev";

// ---------------------------------------------------------------------------
// TorVersion
// ---------------------------------------------------------------------------

/// A parsed Tor version number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub patch: Option<u32>,
    /// Text after the first `-`, e.g. `"dev"` or `"alpha-dev"`.
    pub status: Option<String>,
}

impl TorVersion {
    /// Parse a version string, ignoring a trailing ` (git-...)` annotation.
    pub fn parse(raw: &str) -> Option<Self> {
        let core = raw.trim().split_whitespace().next()?;
        let (numbers, status) = match core.split_once('-') {
            Some((numbers, status)) if !status.is_empty() => (numbers, Some(status.to_string())),
            Some(_) => return None,
            None => (core, None),
        };

        let parts = numbers
            .split('.')
            .map(|p| p.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;

        match parts.as_slice() {
            [major, minor, micro] => Some(Self {
                major: *major,
                minor: *minor,
                micro: *micro,
                patch: None,
                status,
            }),
            [major, minor, micro, patch] => Some(Self {
                major: *major,
                minor: *minor,
                micro: *micro,
                patch: Some(*patch),
                status,
            }),
            _ => None,
        }
    }

    /// Extract the version from a descriptor platform line such as
    /// `"Tor 0.2.4.23 on Linux"`.
    pub fn from_platform(platform: &str) -> Option<String> {
        let mut words = platform.split_whitespace();
        match (words.next(), words.next()) {
            (Some("Tor"), Some(version)) if Self::parse(version).is_some() => {
                Some(version.to_string())
            }
            _ => None,
        }
    }

    pub fn is_dev(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s == DEV_STATUS || s.ends_with("-dev"))
    }

    /// The same version with only the development marker removed:
    /// `0.2.4.23-alpha-dev` becomes `0.2.4.23-alpha`, `0.2.4.23-dev`
    /// becomes `0.2.4.23`.
    pub fn without_dev(&self) -> Self {
        let status = match self.status.as_deref() {
            Some(DEV_STATUS) | None => None,
            Some(status) => Some(status.strip_suffix("-dev").unwrap_or(status).to_string()),
        };
        Self {
            status,
            ..self.clone()
        }
    }

    fn numbers(&self) -> (u32, u32, u32, u32) {
        (self.major, self.minor, self.micro, self.patch.unwrap_or(0))
    }
}

impl Ord for TorVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers()
            .cmp(&other.numbers())
            .then_with(|| match (&self.status, &other.status) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for TorVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        if let Some(status) = &self.status {
            write!(f, "-{status}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Outcome of comparing a relay's version with the recommended list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionStatus {
    Recommended,
    Obsolete,
    /// The relay's version could not be determined.
    Error,
}

impl VersionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recommended => "RECOMMENDED",
            Self::Obsolete => "OBSOLETE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `client_version` against the recommended versions.
///
/// An empty recommended list means the directory authorities could not
/// agree, and every relay is treated as recommended. Development builds newer
/// than everything recommended, or whose form without the `-dev` marker is
/// recommended, are not penalised.
pub fn classify_version(client_version: Option<&str>, recommended: &[String]) -> VersionStatus {
    let Some(raw) = client_version.map(str::trim).filter(|v| !v.is_empty()) else {
        return VersionStatus::Error;
    };
    let Some(client) = TorVersion::parse(raw) else {
        return VersionStatus::Error;
    };

    if recommended.is_empty() {
        return VersionStatus::Recommended;
    }

    let literal = raw.split_whitespace().next().unwrap_or(raw);
    if recommended.iter().any(|r| r.trim() == literal) {
        return VersionStatus::Recommended;
    }

    if client.is_dev() {
        let parsed: Vec<TorVersion> = recommended
            .iter()
            .filter_map(|r| TorVersion::parse(r))
            .collect();

        if parsed.iter().all(|r| *r <= client) {
            return VersionStatus::Recommended;
        }

        let stripped = client.without_dev();
        if parsed.iter().any(|r| *r == stripped) {
            return VersionStatus::Recommended;
        }
    }

    VersionStatus::Obsolete
}

/// Sort version strings ascending, dropping duplicates and unparsable
/// entries.
pub fn sort_versions(versions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut parsed: Vec<(TorVersion, String)> = versions
        .into_iter()
        .filter_map(|v| TorVersion::parse(&v).map(|p| (p, v.trim().to_string())))
        .collect();
    parsed.sort_by(|a, b| a.0.cmp(&b.0));
    parsed.dedup_by(|a, b| a.1 == b.1);
    parsed.into_iter().map(|(_, v)| v).collect()
}
