//! T-shirt eligibility tracking.
//!
//! An episode starts when the router is first seen up and resets whenever it
//! goes down. Operators qualify after 61 days of continuous uptime with an
//! average bandwidth of 500 kB/s, or 100 kB/s for exits. Once emailed, the
//! subscription is never re-armed.

use crate::bandwidth::new_avg_bandwidth;
use crate::model::TShirtSub;
use crate::notice::Notice;
use crate::time::hours_since;
use crate::types::{KiloBytesPerSec, Timestamp};

use super::Transition;

/// Continuous uptime required, in hours (61 days).
pub const REQUIRED_HOURS_UP: i64 = 61 * 24;

pub const EXIT_MIN_BANDWIDTH: KiloBytesPerSec = 100;
pub const RELAY_MIN_BANDWIDTH: KiloBytesPerSec = 500;

/// Facts about the watched router for this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UptimeSample {
    pub up: bool,
    pub exit: bool,
    pub observed: KiloBytesPerSec,
}

pub fn min_bandwidth(exit: bool) -> KiloBytesPerSec {
    if exit {
        EXIT_MIN_BANDWIDTH
    } else {
        RELAY_MIN_BANDWIDTH
    }
}

/// Whether the current episode qualifies for the T-shirt email.
pub fn should_email(sub: &TShirtSub, exit: bool, now: Timestamp) -> bool {
    !sub.emailed
        && sub.triggered
        && hours_since(sub.last_changed, now) >= REQUIRED_HOURS_UP
        && sub.avg_bandwidth >= min_bandwidth(exit)
}

pub fn evaluate(sub: &TShirtSub, sample: UptimeSample, now: Timestamp) -> Transition<TShirtSub> {
    let mut next = sub.clone();

    if !sample.up {
        if sub.triggered {
            next.triggered = false;
            next.avg_bandwidth = 0;
            next.last_changed = now;
        }
        return Transition { next, notice: None };
    }

    if !sub.triggered {
        next.triggered = true;
        next.avg_bandwidth = sample.observed;
        next.last_changed = now;
        return Transition { next, notice: None };
    }

    let hours_up = hours_since(sub.last_changed, now);
    next.avg_bandwidth = new_avg_bandwidth(sub.avg_bandwidth, hours_up, sample.observed);

    if should_email(&next, sample.exit, now) {
        next.emailed = true;
        return Transition {
            notice: Some(Notice::TShirtEarned {
                avg_bandwidth: next.avg_bandwidth,
                hours_up,
                exit: sample.exit,
            }),
            next,
        };
    }

    Transition { next, notice: None }
}
