//! Outbound side of the monitoring engine.
//!
//! - [`delivery`]: mail transports implementing
//!   [`Mailer`](weather_core::mailer::Mailer), SMTP via `lettre` and a
//!   dry-run mailer that only logs.
//! - [`sink`]: append-only text logs for failed emails and unparsable
//!   operator contacts.

pub mod delivery;
pub mod sink;

pub use delivery::dry_run::DryRunMailer;
pub use delivery::email::{EmailConfig, SmtpMailer};
pub use sink::{AppendLog, SinkError};
