//! Elapsed-time helpers shared by the subscription state machines.

use crate::types::Timestamp;

/// Whole hours elapsed between `since` and `now`, truncated.
///
/// A relay that has been down for 89 minutes has been down for 1 hour.
/// Returns 0 when `since` lies in the future (clock skew between passes).
pub fn hours_since(since: Timestamp, now: Timestamp) -> i64 {
    (now - since).num_hours().max(0)
}
