//! Refreshing expiring offline access tokens.
//!
//! Apps that opt into expiring offline tokens receive a refresh token along
//! with each access token. When the access token expires the refresh token is
//! traded for a new pair at the same endpoint used by the other grants.

use crate::auth::oauth::token_endpoint::request_access_token;
use crate::auth::oauth::OAuthError;
use crate::auth::Session;
use crate::config::{ShopDomain, ShopifyConfig};
use serde::Serialize;

const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";

#[derive(Debug, Serialize)]
struct TokenRefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    refresh_token: &'a str,
}

/// Trades a refresh token for a new offline session.
///
/// # Errors
///
/// Returns [`OAuthError::TokenRefreshFailed`] if the endpoint rejects the
/// refresh token or cannot be reached.
pub async fn refresh_access_token(
    config: &ShopifyConfig,
    shop: &ShopDomain,
    refresh_token: &str,
) -> Result<Session, OAuthError> {
    let request_body = TokenRefreshRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        grant_type: REFRESH_TOKEN_GRANT_TYPE,
        refresh_token,
    };

    let token_response = request_access_token(config, shop, &request_body)
        .await
        .map_err(|failure| OAuthError::TokenRefreshFailed {
            status: failure.status,
            message: failure.body,
        })?;

    Ok(Session::from_access_token_response(
        shop.clone(),
        &token_response,
    ))
}
