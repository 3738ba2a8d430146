//! OAuth primitives used by the authentication flow.
//!
//! - **Authorization code grant**: [`begin_auth_url`] builds the
//!   authorization URL; [`validate_auth_callback`] verifies the callback and
//!   exchanges the code.
//! - **Token exchange**: [`exchange_online_token`] and
//!   [`exchange_offline_token`] trade an App Bridge session token for an
//!   access token without a redirect.
//! - **Token refresh**: [`refresh_access_token`] renews an expiring offline
//!   token.
//! - **Session tokens**: [`JwtPayload::decode`] validates App Bridge tokens.
//! - **Signatures**: the [`hmac`] module signs and verifies callbacks and
//!   cookies.
//!
//! Every verification step accepts the old API secret key as well as the
//! current one, so a key rotation does not break flows already in progress.
//!
//! # Example: Authorization Code Flow
//!
//! ```rust,ignore
//! use shopify_app::auth::oauth::{begin_auth_url, validate_auth_callback, AuthQuery, StateParam};
//!
//! // Redirect the merchant and remember the state
//! let state = StateParam::new();
//! let url = begin_auth_url(&config, &shop, false, &state);
//!
//! // In the callback handler
//! let query = AuthQuery::from_pairs(callback_url.query_pairs());
//! let session = validate_auth_callback(&config, &query, stored_state).await?;
//! storage.store_session(&session).await?;
//! ```

mod auth_query;
mod begin_auth;
mod error;
pub mod hmac;
mod jwt_payload;
mod state;
mod token_endpoint;
mod token_exchange;
mod token_refresh;
mod validate_callback;

pub use auth_query::AuthQuery;
pub use begin_auth::begin_auth_url;
pub use error::OAuthError;
pub use hmac::{compute_signature, constant_time_compare, validate_hmac};
pub use jwt_payload::JwtPayload;
pub use state::StateParam;
pub use token_exchange::{
    exchange_offline_token, exchange_online_token, exchange_token, RequestedTokenType,
};
pub use token_refresh::refresh_access_token;
pub use validate_callback::validate_auth_callback;
