//! Route paths owned by the authentication flow.

use crate::error::ConfigError;

/// The app-relative paths the authentication flow reserves.
///
/// All paths hang off a common prefix (`/auth` by default):
///
/// | Path                       | Default               | Purpose                                   |
/// |----------------------------|-----------------------|-------------------------------------------|
/// | `path`                     | `/auth`               | starts OAuth for a `shop`                 |
/// | `callback_path`            | `/auth/callback`      | OAuth redirect URI                        |
/// | `exit_iframe_path`         | `/auth/exit-iframe`   | breaks out of the admin iframe            |
/// | `patch_session_token_path` | `/auth/session-token` | bounce page that fetches a fresh `id_token` |
/// | `login_path`               | `/auth/login`         | where invalid shop/host requests are sent |
///
/// ```rust
/// use shopify_app::AuthPaths;
///
/// let paths = AuthPaths::with_prefix("/shopify/auth").unwrap();
/// assert_eq!(paths.callback_path(), "/shopify/auth/callback");
/// assert_eq!(AuthPaths::default().exit_iframe_path(), "/auth/exit-iframe");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthPaths {
    path: String,
    callback_path: String,
    exit_iframe_path: String,
    patch_session_token_path: String,
    login_path: String,
}

impl AuthPaths {
    /// The prefix used when none is configured.
    pub const DEFAULT_PREFIX: &'static str = "/auth";

    /// Derives every auth path from a common prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAuthPath`] if the prefix does not start
    /// with `/`, or is the app root itself.
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = prefix.into();
        let prefix = raw.trim_end_matches('/').to_string();
        if !raw.starts_with('/') || prefix.is_empty() {
            return Err(ConfigError::InvalidAuthPath { path: raw });
        }

        Ok(Self {
            callback_path: format!("{prefix}/callback"),
            exit_iframe_path: format!("{prefix}/exit-iframe"),
            patch_session_token_path: format!("{prefix}/session-token"),
            login_path: format!("{prefix}/login"),
            path: prefix,
        })
    }

    /// Path that begins OAuth (`/auth`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// OAuth redirect URI path (`/auth/callback`).
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Exit-iframe bounce path (`/auth/exit-iframe`).
    #[must_use]
    pub fn exit_iframe_path(&self) -> &str {
        &self.exit_iframe_path
    }

    /// Session-token bounce path (`/auth/session-token`).
    #[must_use]
    pub fn patch_session_token_path(&self) -> &str {
        &self.patch_session_token_path
    }

    /// Login path (`/auth/login`).
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

impl Default for AuthPaths {
    fn default() -> Self {
        Self {
            path: "/auth".to_string(),
            callback_path: "/auth/callback".to_string(),
            exit_iframe_path: "/auth/exit-iframe".to_string(),
            patch_session_token_path: "/auth/session-token".to_string(),
            login_path: "/auth/login".to_string(),
        }
    }
}
