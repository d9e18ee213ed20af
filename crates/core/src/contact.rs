//! Operator email extraction from free-form relay contact lines.
//!
//! Operators commonly obfuscate their address (`"alice at example dot
//! org"`). [`deobfuscate_email`] undoes the usual spellings and returns
//! `None` when nothing resembling an address can be found, leaving it to the
//! caller to record the unparsable contact.

use std::sync::LazyLock;

use regex::Regex;

/// Candidate address: a token, an `@` or spelled-out `at`, anything, then a
/// `.` or spelled-out `dot` followed by a top-level domain.
static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[^\s]+(?:@|[[:punct:]\s]+at[[:punct:]\s]+).+(?:\.|[[:punct:]\s]+dot[[:punct:]\s]+)[^\n\s\)\(]+",
    )
    .expect("address pattern is valid")
});

static AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[[:punct:]\s]+(?:at|ta)[[:punct:]\s]+").expect("at pattern is valid")
});

static DOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[[:punct:]\s]+(?:dot|tod|d0t)[[:punct:]\s]+").expect("dot pattern is valid")
});

static HYPHEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[[:punct:]\s]+hyphen[[:punct:]\s]+").expect("hyphen pattern is valid")
});

/// Extract an email address from a relay contact line.
pub fn deobfuscate_email(contact: &str) -> Option<String> {
    let clean = contact.replace(['<', '>'], " ");
    let found = ADDRESS.find(&clean)?;

    let email = found.as_str().to_lowercase();
    let email = AT.replace_all(&email, "@");
    let email = DOT.replace_all(&email, ".");
    let email = HYPHEN.replace_all(&email, "-");
    let email: String = email.chars().filter(|c| !c.is_whitespace()).collect();

    (!email.is_empty()).then_some(email)
}
