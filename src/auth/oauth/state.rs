//! OAuth state nonce.
//!
//! The state parameter ties an OAuth callback to the browser that started the
//! flow. [`StateParam::new`] draws a fresh 15-character alphanumeric nonce,
//! which the app keeps in a signed cookie and compares against the `state`
//! Shopify echoes back.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// An OAuth state nonce.
///
/// ```rust
/// use shopify_app::auth::oauth::StateParam;
///
/// let state = StateParam::new();
/// assert_eq!(state.as_ref().len(), 15);
/// assert!(state.as_ref().chars().all(|c| c.is_ascii_alphanumeric()));
///
/// let fixed = StateParam::from_raw("fixed-state");
/// assert_eq!(fixed.to_string(), "fixed-state");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam(String);

impl StateParam {
    const NONCE_LENGTH: usize = 15;

    /// Generates a new random nonce.
    #[must_use]
    pub fn new() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();
        Self(nonce)
    }

    /// Wraps an existing state value, e.g. one read back from a cookie.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_alphanumeric_nonces() {
        let a = StateParam::new();
        let b = StateParam::new();

        assert_eq!(a.as_ref().len(), 15);
        assert!(a.as_ref().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_raw_round_trips() {
        assert_eq!(StateParam::from_raw("abc").as_ref(), "abc");
    }
}
