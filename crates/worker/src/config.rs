use std::path::PathBuf;
use std::time::Duration;

use weather_core::mail::DEFAULT_SENDER;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Worker configuration loaded from environment variables.
///
/// SMTP settings are read separately by
/// [`EmailConfig`](weather_events::EmailConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub database_url: String,
    pub onionoo_url: String,
    /// Upper bound for fetching one snapshot set.
    pub source_timeout: Duration,
    /// Lifetime of cached Onionoo documents.
    pub cache_ttl: Duration,
    pub pass_interval: Duration,
    /// Root of the subscriber-facing site, used in email links.
    pub base_url: String,
    pub sender: String,
    pub failed_email_log: PathBuf,
    pub unparsable_contact_log: PathBuf,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default                           |
    /// |--------------------------|-----------------------------------|
    /// | `DATABASE_URL`           | required                          |
    /// | `ONIONOO_URL`            | `https://onionoo.torproject.org/` |
    /// | `SOURCE_TIMEOUT_SECS`    | `60`                              |
    /// | `ONIONOO_CACHE_TTL_SECS` | `86400`                           |
    /// | `PASS_INTERVAL_SECS`     | `3600`                            |
    /// | `WEATHER_BASE_URL`       | `https://weather.torproject.org`  |
    /// | `WEATHER_SENDER`         | `tor-ops@torproject.org`          |
    /// | `FAILED_EMAIL_LOG`       | `log/failed_emails.txt`           |
    /// | `UNPARSABLE_CONTACT_LOG` | `log/unparsable_emails.txt`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let secs = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match lookup(key) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::Invalid {
                        var: key,
                        value: raw,
                    }),
            }
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            onionoo_url: var("ONIONOO_URL", "https://onionoo.torproject.org/"),
            source_timeout: secs("SOURCE_TIMEOUT_SECS", 60)?,
            cache_ttl: secs("ONIONOO_CACHE_TTL_SECS", 86_400)?,
            pass_interval: secs("PASS_INTERVAL_SECS", 3600)?,
            base_url: var("WEATHER_BASE_URL", "https://weather.torproject.org"),
            sender: var("WEATHER_SENDER", DEFAULT_SENDER),
            failed_email_log: var("FAILED_EMAIL_LOG", "log/failed_emails.txt").into(),
            unparsable_contact_log: var("UNPARSABLE_CONTACT_LOG", "log/unparsable_emails.txt")
                .into(),
        })
    }
}
