//! Client for the Onionoo relay-directory API.
//!
//! [`OnionooClient`] fetches typed summary and details documents through an
//! explicit [`DocumentCache`]; [`OnionooSource`] turns them into the
//! [`SnapshotSet`](weather_core::relay::SnapshotSet) the worker consumes.

pub mod cache;
pub mod client;
pub mod documents;
pub mod query;
pub mod source;

pub use cache::{DocumentCache, InMemoryDocumentCache};
pub use client::{OnionooClient, OnionooError};
pub use query::{DocumentKind, OnionooQuery};
pub use source::OnionooSource;
