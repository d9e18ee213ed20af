//! Mail transports.

pub mod dry_run;
pub mod email;
