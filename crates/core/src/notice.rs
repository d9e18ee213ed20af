//! Notifications produced by the engine, before rendering.

use serde::Serialize;

use crate::fingerprint::Fingerprint;
use crate::model::{Router, Subscriber};
use crate::types::KiloBytesPerSec;
use crate::version::VersionStatus;

/// The condition a subscription reports on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    NodeDown {
        grace_pd: i32,
    },
    VersionObsolete {
        status: VersionStatus,
    },
    LowBandwidth {
        observed: KiloBytesPerSec,
        threshold: KiloBytesPerSec,
    },
    TShirtEarned {
        avg_bandwidth: KiloBytesPerSec,
        hours_up: i64,
        exit: bool,
    },
}

impl Notice {
    /// Short label used in logs and pass reports.
    pub fn kind(&self) -> NoticeKind {
        match self {
            Self::NodeDown { .. } => NoticeKind::NodeDown,
            Self::VersionObsolete { .. } => NoticeKind::Version,
            Self::LowBandwidth { .. } => NoticeKind::Bandwidth,
            Self::TShirtEarned { .. } => NoticeKind::TShirt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    NodeDown,
    Version,
    Bandwidth,
    TShirt,
    Welcome,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NodeDown => "node_down",
            Self::Version => "version",
            Self::Bandwidth => "bandwidth",
            Self::TShirt => "tshirt",
            Self::Welcome => "welcome",
        }
    }
}

/// Router identity as it appears in an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterLabel {
    pub fingerprint: Fingerprint,
    pub name: String,
}

impl From<&Router> for RouterLabel {
    fn from(router: &Router) -> Self {
        Self {
            fingerprint: router.fingerprint.clone(),
            name: router.name.clone(),
        }
    }
}

/// Links that let a subscriber manage their subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FooterAuth {
    pub unsubs_auth: String,
    pub pref_auth: String,
}

/// A notification addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Sent to a subscriber when one of their subscriptions fires.
    Subscription {
        recipient: String,
        router: RouterLabel,
        auth: FooterAuth,
        notice: Notice,
    },
    /// Sent once to the operator of a newly stable relay.
    Welcome {
        recipient: String,
        router: RouterLabel,
        exit: bool,
    },
}

impl Notification {
    pub fn for_subscriber(subscriber: &Subscriber, router: &Router, notice: Notice) -> Self {
        Self::Subscription {
            recipient: subscriber.email.clone(),
            router: router.into(),
            auth: FooterAuth {
                unsubs_auth: subscriber.unsubs_auth.clone(),
                pref_auth: subscriber.pref_auth.clone(),
            },
            notice,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Self::Subscription { recipient, .. } | Self::Welcome { recipient, .. } => recipient,
        }
    }

    pub fn kind(&self) -> NoticeKind {
        match self {
            Self::Subscription { notice, .. } => notice.kind(),
            Self::Welcome { .. } => NoticeKind::Welcome,
        }
    }
}
