//! Relay monitoring worker.
//!
//! [`coordinator::RunCoordinator`] runs one pass at a time against the
//! store, relay source and mailer seams defined in `weather-core`;
//! [`scheduler::run`] triggers passes on a timer. The binary in `main.rs`
//! wires the PostgreSQL store, the Onionoo source and the SMTP mailer.

pub mod checks;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod outbox;
pub mod scheduler;

pub use config::{ConfigError, WorkerConfig};
pub use coordinator::{PassReport, RunCoordinator};
pub use error::PassError;
pub use outbox::Outbox;
