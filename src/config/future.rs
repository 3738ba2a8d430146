//! Opt-in behaviour switches.
//!
//! Each [`FutureFlag`] turns on one alternate path in the authentication
//! strategy. The strategy receives the whole [`FutureFlags`] set through the
//! config and asks it explicitly; nothing branches on ambient state.

use std::collections::HashSet;

/// A single opt-in behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FutureFlag {
    /// Embedded apps obtain access tokens through token exchange instead of
    /// the authorization-code redirect flow.
    NewEmbeddedAuthStrategy,

    /// Expired offline sessions that carry a refresh token are refreshed in
    /// place instead of sending the merchant back through OAuth.
    ExpiringOfflineAccessTokens,
}

/// The set of enabled [`FutureFlag`]s.
///
/// ```rust
/// use shopify_app::{FutureFlag, FutureFlags};
///
/// let flags: FutureFlags = [FutureFlag::NewEmbeddedAuthStrategy].into_iter().collect();
/// assert!(flags.is_enabled(FutureFlag::NewEmbeddedAuthStrategy));
/// assert!(!flags.is_enabled(FutureFlag::ExpiringOfflineAccessTokens));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FutureFlags {
    enabled: HashSet<FutureFlag>,
}

impl FutureFlags {
    /// Creates an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set with `flag` enabled.
    #[must_use]
    pub fn with(mut self, flag: FutureFlag) -> Self {
        self.enabled.insert(flag);
        self
    }

    /// Returns `true` if `flag` is enabled.
    #[must_use]
    pub fn is_enabled(&self, flag: FutureFlag) -> bool {
        self.enabled.contains(&flag)
    }
}

impl FromIterator<FutureFlag> for FutureFlags {
    fn from_iter<I: IntoIterator<Item = FutureFlag>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}
