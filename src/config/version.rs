//! Admin API version selection.
//!
//! The app only talks to the Admin API for the session probe and for the
//! GraphQL client handed out in [`AdminContext`](crate::AdminContext), so the
//! version is just a path segment: `/admin/api/{version}/graphql.json`.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Shopify Admin API version.
///
/// ```rust
/// use shopify_app::ApiVersion;
///
/// let version: ApiVersion = "2025-10".parse().unwrap();
/// assert_eq!(version, ApiVersion::V2025_10);
/// assert_eq!(ApiVersion::Unstable.to_string(), "unstable");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// API version 2025-04 (April 2025)
    V2025_04,
    /// API version 2025-07 (July 2025)
    V2025_07,
    /// API version 2025-10 (October 2025)
    V2025_10,
    /// API version 2026-01 (January 2026)
    V2026_01,
    /// Unstable API version for development and testing.
    Unstable,
    /// Any other `YYYY-MM` release.
    Custom(String),
}

impl ApiVersion {
    /// Returns the latest stable API version known to this crate.
    #[must_use]
    pub const fn latest() -> Self {
        Self::V2026_01
    }

    /// Returns `true` for the named stable releases.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        !matches!(self, Self::Unstable | Self::Custom(_))
    }

    fn is_valid_version_format(s: &str) -> bool {
        let Some((year, month)) = s.split_once('-') else {
            return false;
        };

        year.len() == 4
            && year.chars().all(|c| c.is_ascii_digit())
            && matches!(month, "01" | "04" | "07" | "10")
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version_str = match self {
            Self::V2025_04 => "2025-04",
            Self::V2025_07 => "2025-07",
            Self::V2025_10 => "2025-10",
            Self::V2026_01 => "2026-01",
            Self::Unstable => "unstable",
            Self::Custom(s) => s,
        };
        f.write_str(version_str)
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "2025-04" => Ok(Self::V2025_04),
            "2025-07" => Ok(Self::V2025_07),
            "2025-10" => Ok(Self::V2025_10),
            "2026-01" => Ok(Self::V2026_01),
            "unstable" => Ok(Self::Unstable),
            _ if Self::is_valid_version_format(&s) => Ok(Self::Custom(s)),
            _ => Err(ConfigError::InvalidApiVersion { version: s }),
        }
    }
}
