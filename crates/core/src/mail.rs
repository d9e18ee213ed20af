//! Plain-text rendering of notifications into outgoing emails.

use serde::Serialize;

use crate::model::display_name;
use crate::notice::{FooterAuth, Notice, Notification, RouterLabel};

pub const SUBJECT_PREFIX: &str = "[Tor Weather] ";
pub const DEFAULT_SENDER: &str = "tor-ops@torproject.org";
pub const DOWNLOAD_URL: &str = "https://www.torproject.org/easy-download.html";
pub const TSHIRT_URL: &str = "https://www.torproject.org/getinvolved/tshirt.html";
pub const ANNOUNCE_LIST_URL: &str =
    "https://lists.torproject.org/cgi-bin/mailman/listinfo/tor-announce";
pub const LEGAL_FAQ_URL: &str = "https://www.torproject.org/eff/tor-legal-faq.html.en";
pub const EXIT_TIPS_URL: &str =
    "https://blog.torproject.org/blog/tips-running-exit-node-minimal-harassment";

/// A rendered message ready for the mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipients: Vec<String>,
}

/// Renders [`Notification`]s with deployment-specific links.
#[derive(Debug, Clone)]
pub struct MailComposer {
    base_url: String,
    sender: String,
}

impl MailComposer {
    pub fn new(base_url: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sender: sender.into(),
        }
    }

    pub fn unsubscribe_url(&self, unsubs_auth: &str) -> String {
        format!("{}/unsubscribe/{unsubs_auth}/", self.base_url)
    }

    pub fn preferences_url(&self, pref_auth: &str) -> String {
        format!("{}/preferences/{pref_auth}/", self.base_url)
    }

    pub fn home_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    pub fn compose(&self, notification: &Notification) -> OutgoingEmail {
        let (subject, body) = match notification {
            Notification::Subscription {
                router,
                auth,
                notice,
                ..
            } => {
                let (subject, body) = self.subscription_body(router, notice);
                (subject, format!("{body}{}", self.footer(auth)))
            }
            Notification::Welcome { router, exit, .. } => {
                ("Welcome to Tor!", self.welcome_body(router, *exit))
            }
        };

        OutgoingEmail {
            subject: format!("{SUBJECT_PREFIX}{subject}"),
            body,
            sender: self.sender.clone(),
            recipients: vec![notification.recipient().to_string()],
        }
    }

    fn subscription_body(&self, router: &RouterLabel, notice: &Notice) -> (&'static str, String) {
        let label = display_name(&router.name, &router.fingerprint);
        match notice {
            Notice::NodeDown { grace_pd } => (
                "Node Down!",
                format!(
                    "This is a Tor Weather Report.\n\n\
                     It appears that the node {label} you've been observing has been \
                     uncontactable through the Tor network for at least {}. \
                     You may wish to look at it to see why.",
                    hours_phrase(*grace_pd)
                ),
            ),
            Notice::VersionObsolete { status } => (
                "Node Out of Date!",
                format!(
                    "This is a Tor Weather Report.\n\n\
                     It appears that the Tor node {label} you've been observing is running \
                     an {} version of Tor. You can download the latest version of Tor at \
                     {DOWNLOAD_URL}.",
                    status.as_str().to_lowercase()
                ),
            ),
            Notice::LowBandwidth {
                observed,
                threshold,
            } => (
                "Low bandwidth!",
                format!(
                    "This is a Tor Weather Report.\n\n\
                     It appears that the tor node {label} you've been observing has an \
                     observed bandwidth capacity of {observed} kB/s. You elected to receive \
                     notifications if this node's bandwidth capacity passed a threshold of \
                     {threshold} kB/s. You may wish to look at your router to see why."
                ),
            ),
            Notice::TShirtEarned {
                avg_bandwidth,
                hours_up,
                exit,
            } => {
                let running = if *exit {
                    "running as an exit node"
                } else {
                    "running"
                };
                (
                    "Congratulations! Have a T-shirt!",
                    format!(
                        "This is a Tor Weather Report.\n\n\
                         Congratulations! The node {label} you've been observing has been \
                         {running} for {} days with an average bandwidth of {avg_bandwidth} \
                         kB/s, which makes the operator eligible to receive an official Tor \
                         T-shirt! If you're interested in claiming your shirt, please visit \
                         the following link for more information.\n\n\
                         {TSHIRT_URL}\n\n\
                         You might want to include this message in your email. \
                         Thank you for your contribution to the Tor network!",
                        hours_up / 24
                    ),
                )
            }
        }
    }

    fn welcome_body(&self, router: &RouterLabel, exit: bool) -> String {
        let label = display_name(&router.name, &router.fingerprint);
        let legal = if exit {
            format!(
                "Additionally, since you are running as an exit node, you might be \
                 interested in Tor's Legal FAQ for Relay Operators ({LEGAL_FAQ_URL}) \
                 and the blog post on running an exit node ({EXIT_TIPS_URL}).\n\n"
            )
        } else {
            String::new()
        };

        format!(
            "Hello and welcome to Tor!\n\n\
             We've noticed that your Tor node {label} has been running long enough to be \
             flagged as \"stable\". First, we would like to thank you for your contribution \
             to the Tor network! As Tor grows, we require ever more nodes to improve browsing \
             speed and reliability for our users. Your node is helping to serve the millions \
             of Tor clients out there.\n\n\
             As a node operator, you may be interested in the Tor Weather service, which \
             sends important email notifications when a node is down or your version is out \
             of date. If you're interested in Tor Weather, please visit the following link \
             to register:\n\n\
             {home}\n\n\
             You might also be interested in the tor-announce mailing list, which is a low \
             volume list for announcements of new releases and critical security updates. \
             To join, visit the following address:\n\n\
             {ANNOUNCE_LIST_URL}\n\n\
             {legal}Thank you again for your contribution to the Tor network! We won't send \
             you any further emails unless you subscribe.\n\n\
             Disclaimer: If you have no idea why you're receiving this email, we sincerely \
             apologize! You shouldn't hear from us again.",
            home = self.home_url(),
        )
    }

    fn footer(&self, auth: &FooterAuth) -> String {
        format!(
            "\n\nYou can unsubscribe from these reports at any time by visiting the \
             following url:\n\n{}\n\nor change your Tor Weather notification preferences \
             here: \n\n{}",
            self.unsubscribe_url(&auth.unsubs_auth),
            self.preferences_url(&auth.pref_auth)
        )
    }
}

/// `"1 hour"`, `"3 hours"`.
fn hours_phrase(hours: i32) -> String {
    if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{hours} hours")
    }
}
