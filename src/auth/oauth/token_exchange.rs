//! OAuth 2.0 Token Exchange (RFC 8693) for embedded apps.
//!
//! An embedded app already holds a session token from App Bridge. Instead of
//! redirecting through the authorization-code flow, it can trade that token
//! for an access token directly:
//!
//! - grant type: `urn:ietf:params:oauth:grant-type:token-exchange`
//! - subject token type: `urn:ietf:params:oauth:token-type:id_token`
//! - requested token type: the online or offline access token URN
//!
//! A `400` answer with `{"error": "invalid_subject_token"}` means Shopify
//! rejected the session token and is reported as [`OAuthError::InvalidJwt`],
//! so callers can treat it like any other bad session token.

use crate::auth::oauth::jwt_payload::JwtPayload;
use crate::auth::oauth::token_endpoint::request_access_token;
use crate::auth::oauth::OAuthError;
use crate::auth::Session;
use crate::config::{ShopDomain, ShopifyConfig};
use serde::{Deserialize, Serialize};

const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";

/// Access token kind requested from the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedTokenType {
    /// User-specific, expiring token.
    OnlineAccessToken,
    /// App-level token.
    OfflineAccessToken,
}

impl RequestedTokenType {
    /// Returns the URN sent as `requested_token_type`.
    #[must_use]
    pub const fn as_urn(self) -> &'static str {
        match self {
            Self::OnlineAccessToken => "urn:shopify:params:oauth:token-type:online-access-token",
            Self::OfflineAccessToken => "urn:shopify:params:oauth:token-type:offline-access-token",
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    subject_token: &'a str,
    subject_token_type: &'a str,
    requested_token_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenExchangeErrorResponse {
    error: Option<String>,
}

/// Exchanges a session token for an access token of the requested kind.
///
/// The session token is validated locally before the request is made. The
/// returned session keeps the token's `sid` as `shopify_session_id`.
///
/// # Errors
///
/// - [`OAuthError::NotEmbeddedApp`] if the config is not for an embedded app
/// - [`OAuthError::InvalidJwt`] if the session token is invalid or was rejected
/// - [`OAuthError::TokenExchangeFailed`] for any other endpoint failure
pub async fn exchange_token(
    config: &ShopifyConfig,
    shop: &ShopDomain,
    session_token: &str,
    requested_token_type: RequestedTokenType,
) -> Result<Session, OAuthError> {
    if !config.is_embedded() {
        return Err(OAuthError::NotEmbeddedApp);
    }

    let payload = JwtPayload::decode(session_token, config)?;

    let request_body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        grant_type: TOKEN_EXCHANGE_GRANT_TYPE,
        subject_token: session_token,
        subject_token_type: ID_TOKEN_TYPE,
        requested_token_type: requested_token_type.as_urn(),
    };

    let token_response = request_access_token(config, shop, &request_body)
        .await
        .map_err(|failure| {
            let rejected = failure.status == 400
                && serde_json::from_str::<TokenExchangeErrorResponse>(&failure.body)
                    .ok()
                    .and_then(|response| response.error)
                    .is_some_and(|error| error == "invalid_subject_token");

            if rejected {
                OAuthError::InvalidJwt {
                    reason: "Session token was rejected by token exchange".to_string(),
                }
            } else {
                OAuthError::TokenExchangeFailed {
                    status: failure.status,
                    message: failure.body,
                }
            }
        })?;

    let mut session = Session::from_access_token_response(shop.clone(), &token_response);
    session.shopify_session_id = payload.sid;

    Ok(session)
}

/// Exchanges a session token for an online access token.
///
/// # Errors
///
/// See [`exchange_token`].
pub async fn exchange_online_token(
    config: &ShopifyConfig,
    shop: &ShopDomain,
    session_token: &str,
) -> Result<Session, OAuthError> {
    exchange_token(
        config,
        shop,
        session_token,
        RequestedTokenType::OnlineAccessToken,
    )
    .await
}

/// Exchanges a session token for an offline access token.
///
/// # Errors
///
/// See [`exchange_token`].
pub async fn exchange_offline_token(
    config: &ShopifyConfig,
    shop: &ShopDomain,
    session_token: &str,
) -> Result<Session, OAuthError> {
    exchange_token(
        config,
        shop,
        session_token,
        RequestedTokenType::OfflineAccessToken,
    )
    .await
}
