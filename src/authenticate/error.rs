//! Errors raised while authenticating an admin request.

use axum::http::StatusCode;
use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::session_storage::SessionStorageError;

/// Errors that end authentication without a redirect.
///
/// Recoverable conditions (no session, expired session, token for another
/// shop) never surface here; they resolve to a
/// [`Redirect`](crate::authenticate::Redirect). Each error maps to an HTTP
/// status through [`AuthError::status`].
///
/// # Example
///
/// ```rust
/// use shopify_app::authenticate::AuthError;
///
/// let error = AuthError::Upstream { status: 503, message: "unavailable".to_string() };
/// assert_eq!(error.status().as_u16(), 503);
/// assert_eq!(AuthError::MissingShop.status().as_u16(), 400);
/// ```
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither a `shop` parameter nor a session cookie identifies the shop.
    #[error("Shop could not be determined from the request")]
    MissingShop,

    /// The `shop` parameter is not a valid shop domain.
    #[error("Shop param is invalid: {shop}")]
    InvalidShop {
        /// The rejected value.
        shop: String,
    },

    /// The request itself is unusable.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// What is wrong with the request.
        reason: String,
    },

    /// An XHR request carried a missing or invalid session token.
    #[error("Invalid session token")]
    InvalidSessionToken {
        /// Whether the frontend should fetch a new token and retry.
        retry: bool,
    },

    /// The OAuth callback failed validation.
    #[error("Invalid OAuth Request: {0}")]
    InvalidCallback(#[source] OAuthError),

    /// The exit-iframe destination is neither relative nor on the app URL.
    #[error("Invalid exit iframe destination: {destination}")]
    InvalidExitIframeDestination {
        /// The rejected destination.
        destination: String,
    },

    /// The Admin API answered the session check with an unexpected status.
    #[error("Upstream request failed with status {status}: {message}")]
    Upstream {
        /// Status returned upstream, passed through to the client.
        status: u16,
        /// Message extracted from the upstream body.
        message: String,
    },

    /// The Admin API answered the session check with GraphQL errors.
    #[error("Upstream response contained errors: {message}")]
    MalformedUpstreamResponse {
        /// Message extracted from the upstream body.
        message: String,
    },

    /// `authenticate_admin` was called from the login route.
    #[error(
        "Detected call to authenticate_admin() from configured login path ('{path}'), please make sure to call login() from that route instead."
    )]
    CalledFromLoginPath {
        /// The configured login path.
        path: String,
    },

    /// The session store failed.
    #[error(transparent)]
    Storage(#[from] SessionStorageError),

    /// An OAuth operation failed.
    #[error(transparent)]
    OAuth(#[from] OAuthError),
}

impl AuthError {
    /// Returns the HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingShop
            | Self::InvalidShop { .. }
            | Self::InvalidRequest { .. }
            | Self::InvalidCallback(_)
            | Self::InvalidExitIframeDestination { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidSessionToken { .. } => StatusCode::UNAUTHORIZED,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::MalformedUpstreamResponse { .. }
            | Self::CalledFromLoginPath { .. }
            | Self::Storage(_)
            | Self::OAuth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_passed_through() {
        let error = AuthError::Upstream {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unusable_upstream_status_becomes_500() {
        let error = AuthError::Upstream {
            status: 42,
            message: String::new(),
        };
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_callback_is_bad_request() {
        let error = AuthError::InvalidCallback(OAuthError::InvalidHmac);
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("Invalid OAuth Request"));
    }

    #[test]
    fn test_invalid_session_token_is_unauthorized() {
        assert_eq!(
            AuthError::InvalidSessionToken { retry: true }.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
