//! Low-bandwidth alerts. Plain threshold crossing, no hysteresis band.

use crate::model::BandwidthSub;
use crate::notice::Notice;
use crate::types::KiloBytesPerSec;

use super::Transition;

pub fn evaluate(sub: &BandwidthSub, observed: KiloBytesPerSec) -> Transition<BandwidthSub> {
    let mut next = sub.clone();

    if observed >= sub.threshold {
        next.emailed = false;
        return Transition { next, notice: None };
    }

    if sub.emailed {
        return Transition { next, notice: None };
    }

    next.emailed = true;
    Transition {
        next,
        notice: Some(Notice::LowBandwidth {
            observed,
            threshold: sub.threshold,
        }),
    }
}
