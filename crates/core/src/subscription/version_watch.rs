//! Obsolete-version alerts.

use crate::model::VersionSub;
use crate::notice::Notice;
use crate::version::{classify_version, VersionStatus};

use super::{Evaluation, SkipReason, Transition};

pub fn evaluate(
    sub: &VersionSub,
    version: Option<&str>,
    recommended: &[String],
) -> Evaluation<VersionSub> {
    let mut next = sub.clone();
    let notice = match classify_version(version, recommended) {
        VersionStatus::Error => return Evaluation::Skipped(SkipReason::UnknownVersion),
        VersionStatus::Obsolete if !sub.emailed => {
            next.emailed = true;
            Some(Notice::VersionObsolete {
                status: VersionStatus::Obsolete,
            })
        }
        VersionStatus::Obsolete => None,
        VersionStatus::Recommended => {
            next.emailed = false;
            None
        }
    };
    Evaluation::Evaluated(Transition { next, notice })
}
