//! Relay data seam.

use async_trait::async_trait;

use crate::relay::{SnapshotError, SnapshotSet};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Relay source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed relay document: {0}")]
    Decode(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Supplies one consistent [`SnapshotSet`] per pass.
#[async_trait]
pub trait RelaySource: Send + Sync {
    async fn fetch(&self) -> Result<SnapshotSet, SourceError>;
}
