//! OAuth access scopes.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth access scopes.
///
/// Scopes are parsed from the comma-separated form Shopify uses both in the
/// authorization URL and in token responses. Write scopes imply the matching
/// read scope (`write_products` grants `read_products`), and the set is
/// expanded accordingly so that [`covers`](Self::covers) compares like with
/// like.
///
/// The set is ordered, so [`Display`](fmt::Display) output is stable. That
/// keeps the authorization URL identical for identical configuration.
///
/// ```rust
/// use shopify_app::AuthScopes;
///
/// let granted: AuthScopes = "write_products, read_orders".parse().unwrap();
/// let required: AuthScopes = "read_products".parse().unwrap();
///
/// assert!(granted.covers(&required));
/// assert_eq!(granted.to_string(), "read_orders,read_products,write_products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if every scope in `other` is in this set.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.is_subset(&self.scopes)
    }

    /// Returns an iterator over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn implied(scope: &str) -> Option<String> {
        if let Some(rest) = scope.strip_prefix("unauthenticated_write_") {
            return Some(format!("unauthenticated_read_{rest}"));
        }
        scope
            .strip_prefix("write_")
            .map(|rest| format!("read_{rest}"))
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }
            if let Some(implied) = Self::implied(scope) {
                scopes.insert(implied);
            }
            scopes.insert(scope.to_string());
        }

        Ok(Self { scopes })
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.scopes.iter().map(String::as_str).collect::<Vec<_>>();
        f.write_str(&joined.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
