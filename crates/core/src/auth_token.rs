//! Subscriber authorization tokens.
//!
//! Confirmation, unsubscribe and preferences links each carry an opaque
//! random token. Tokens are embedded in URLs ending in `/`, so they use the
//! URL-safe alphabet and never end in `-`.

use rand::Rng;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of a generated token.
pub const TOKEN_LENGTH: usize = 24;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate a new random authorization token.
pub fn generate_auth_token() -> String {
    let mut rng = rand::rng();
    let mut token: String = (0..TOKEN_LENGTH - 1)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();
    // '-' is last in the alphabet; the final character never uses it.
    let tail = &ALPHABET[..ALPHABET.len() - 1];
    token.push(char::from(tail[rng.random_range(0..tail.len())]));
    token
}

/// The three tokens a new subscriber is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberTokens {
    pub confirm_auth: String,
    pub unsubs_auth: String,
    pub pref_auth: String,
}

impl SubscriberTokens {
    pub fn generate() -> Self {
        Self {
            confirm_auth: generate_auth_token(),
            unsubs_auth: generate_auth_token(),
            pref_auth: generate_auth_token(),
        }
    }
}
