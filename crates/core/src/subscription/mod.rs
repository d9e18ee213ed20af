//! Per-kind subscription state machines.
//!
//! Each machine is a pure function from the persisted subscription, the
//! router facts refreshed by the registry pass, and `now` to a
//! [`Transition`]: the next persisted state plus at most one notice. The
//! caller saves `next` and only then queues the notice, so the two are
//! applied together or not at all.

pub mod low_bandwidth;
pub mod node_down;
pub mod tshirt;
pub mod version_watch;

use crate::notice::Notice;

/// Result of evaluating one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S> {
    pub next: S,
    pub notice: Option<Notice>,
}

impl<S: PartialEq> Transition<S> {
    /// Whether `next` differs from `previous` and must be persisted.
    pub fn is_change(&self, previous: &S) -> bool {
        self.next != *previous
    }
}

/// Why a subscription was not evaluated this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The relay's version could not be determined.
    UnknownVersion,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownVersion => "unknown_version",
        }
    }
}

/// Outcome of a machine that may decline to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation<S> {
    Evaluated(Transition<S>),
    Skipped(SkipReason),
}
