use std::time::Duration;

use weather_core::relay::SnapshotError;
use weather_core::source::SourceError;
use weather_core::store::StoreError;

/// Reasons a pass stops early.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("A pass is already running")]
    AlreadyRunning,

    #[error("Relay source timed out after {0:?}")]
    SourceTimeout(Duration),

    #[error("Relay source failed: {0}")]
    Source(SourceError),

    #[error("Snapshot set rejected: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<SourceError> for PassError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Snapshot(e) => Self::Snapshot(e),
            other => Self::Source(other),
        }
    }
}
