//! OAuth error types.
//!
//! # Example
//!
//! ```rust
//! use shopify_app::auth::oauth::OAuthError;
//!
//! let error = OAuthError::InvalidHmac;
//! assert_eq!(error.to_string(), "HMAC signature validation failed");
//!
//! let error = OAuthError::StateMismatch {
//!     expected: "abc123".to_string(),
//!     received: "xyz789".to_string(),
//! };
//! assert!(error.to_string().contains("abc123"));
//! ```

use crate::clients::HttpError;
use thiserror::Error;

/// Errors that can occur during OAuth operations.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The callback's HMAC does not match any configured secret.
    #[error("HMAC signature validation failed")]
    InvalidHmac,

    /// The callback's `state` does not match the state cookie.
    #[error("State parameter mismatch: expected '{expected}', received '{received}'")]
    StateMismatch {
        /// The state stored when OAuth began.
        expected: String,
        /// The state received in the callback.
        received: String,
    },

    /// The callback carries no state cookie to compare against.
    #[error("OAuth state cookie is missing or its signature is invalid")]
    MissingStateCookie,

    /// Callback parameters are missing or malformed.
    #[error("Invalid callback: {reason}")]
    InvalidCallback {
        /// What is wrong with the callback.
        reason: String,
    },

    /// A session token could not be decoded, or Shopify rejected it.
    #[error("Invalid session token: {reason}")]
    InvalidJwt {
        /// Why the token was rejected.
        reason: String,
    },

    /// Token exchange requires an embedded app.
    #[error("Token exchange is only available to embedded apps")]
    NotEmbeddedApp,

    /// The token endpoint answered the authorization-code or token-exchange
    /// grant with a non-success status.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned (0 for network failures).
        status: u16,
        /// The response body or failure description.
        message: String,
    },

    /// The token endpoint rejected a refresh token.
    #[error("Token refresh failed with status {status}: {message}")]
    TokenRefreshFailed {
        /// The HTTP status code returned (0 for network failures).
        status: u16,
        /// The response body or failure description.
        message: String,
    },

    /// Wrapped HTTP client error.
    #[error(transparent)]
    HttpError(#[from] HttpError),
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
