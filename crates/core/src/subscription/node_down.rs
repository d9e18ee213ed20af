//! Node-down alerts with a per-subscription grace period.
//!
//! States: `Up`, `Triggered(since)` and `Notified(since)`. Entering
//! `Triggered` never emails in the same pass; the grace check runs on
//! later passes against `last_changed`.

use crate::model::NodeDownSub;
use crate::notice::Notice;
use crate::time::hours_since;
use crate::types::Timestamp;

use super::Transition;

/// Facts about the watched router for this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeState {
    pub up: bool,
    pub hibernating: bool,
}

/// Whether a triggered subscription has waited out its grace period.
pub fn should_email(sub: &NodeDownSub, now: Timestamp) -> bool {
    sub.triggered && !sub.emailed && hours_since(sub.last_changed, now) >= i64::from(sub.grace_pd)
}

pub fn evaluate(sub: &NodeDownSub, node: NodeState, now: Timestamp) -> Transition<NodeDownSub> {
    let mut next = sub.clone();

    if node.up {
        if sub.triggered {
            next.triggered = false;
            next.emailed = false;
            next.last_changed = now;
        }
        return Transition { next, notice: None };
    }

    // Hibernating relays are expected to look down.
    if node.hibernating {
        return Transition { next, notice: None };
    }

    if !sub.triggered {
        next.triggered = true;
        next.emailed = false;
        next.last_changed = now;
        return Transition { next, notice: None };
    }

    if should_email(sub, now) {
        next.emailed = true;
        return Transition {
            next,
            notice: Some(Notice::NodeDown {
                grace_pd: sub.grace_pd,
            }),
        };
    }

    Transition { next, notice: None }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    const UP: NodeState = NodeState {
        up: true,
        hibernating: false,
    };
    const DOWN: NodeState = NodeState {
        up: false,
        hibernating: false,
    };
    const HIBERNATING: NodeState = NodeState {
        up: false,
        hibernating: true,
    };

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn sub(grace_pd: i32) -> NodeDownSub {
        NodeDownSub {
            id: 1,
            subscriber_id: 1,
            emailed: false,
            triggered: false,
            grace_pd,
            last_changed: t0() - Duration::days(10),
        }
    }

    #[test]
    fn down_relay_enters_triggered_without_email() {
        let now = t0();
        let t = evaluate(&sub(0), DOWN, now);
        assert!(t.next.triggered);
        assert!(!t.next.emailed);
        assert_eq!(t.next.last_changed, now);
        assert!(t.notice.is_none());
    }

    #[test]
    fn grace_period_gates_the_email() {
        let mut s = sub(2);
        s.triggered = true;
        s.last_changed = t0();

        let early = evaluate(&s, DOWN, t0() + Duration::minutes(119));
        assert!(early.notice.is_none());
        assert!(!early.next.emailed);

        let due = evaluate(&s, DOWN, t0() + Duration::minutes(120));
        assert_eq!(due.notice, Some(Notice::NodeDown { grace_pd: 2 }));
        assert!(due.next.emailed);
    }

    #[test]
    fn zero_grace_emails_on_the_following_pass() {
        let first = evaluate(&sub(0), DOWN, t0());
        assert!(first.notice.is_none());
        let second = evaluate(&first.next, DOWN, t0() + Duration::minutes(5));
        assert!(second.notice.is_some());
    }

    #[test]
    fn notified_subscription_stays_quiet() {
        let mut s = sub(1);
        s.triggered = true;
        s.emailed = true;
        s.last_changed = t0();
        let t = evaluate(&s, DOWN, t0() + Duration::hours(5));
        assert!(t.notice.is_none());
        assert!(!t.is_change(&s));
    }

    #[test]
    fn recovery_clears_flags() {
        let mut s = sub(1);
        s.triggered = true;
        s.emailed = true;
        let now = t0() + Duration::hours(3);
        let t = evaluate(&s, UP, now);
        assert!(!t.next.triggered);
        assert!(!t.next.emailed);
        assert_eq!(t.next.last_changed, now);
        assert!(t.notice.is_none());
    }

    #[test]
    fn up_and_untriggered_is_unchanged() {
        let s = sub(1);
        assert!(!evaluate(&s, UP, t0()).is_change(&s));
    }

    #[test]
    fn hibernating_relay_neither_triggers_nor_emails() {
        let s = sub(0);
        let t = evaluate(&s, HIBERNATING, t0());
        assert!(!t.is_change(&s));

        let mut triggered = sub(0);
        triggered.triggered = true;
        let t = evaluate(&triggered, HIBERNATING, t0());
        assert!(t.notice.is_none());
        assert!(!t.is_change(&triggered));
    }

    #[test]
    fn repeated_evaluation_is_idempotent() {
        let mut s = sub(1);
        s.triggered = true;
        s.last_changed = t0();
        let now = t0() + Duration::hours(2);
        let first = evaluate(&s, DOWN, now);
        let second = evaluate(&first.next, DOWN, now);
        assert!(first.notice.is_some());
        assert!(second.notice.is_none());
        assert!(second.next.emailed);
    }
}
