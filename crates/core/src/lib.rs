//! Domain logic for the relay monitoring engine.
//!
//! Everything here is free of I/O: the state machines, the registry
//! reconciliation and the email templates take plain values and return plain
//! values. The `store`, `source` and `mailer` modules define the traits the
//! worker uses to reach persistence, relay data and mail transport.

pub mod auth_token;
pub mod bandwidth;
pub mod contact;
pub mod error;
pub mod exit_policy;
pub mod fingerprint;
pub mod mail;
pub mod mailer;
pub mod model;
pub mod notice;
pub mod registry;
pub mod relay;
pub mod source;
pub mod store;
pub mod subscription;
pub mod time;
pub mod types;
pub mod version;
