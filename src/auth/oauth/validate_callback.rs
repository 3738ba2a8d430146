//! OAuth callback validation and code exchange.

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::hmac::{constant_time_compare, validate_hmac};
use crate::auth::oauth::token_endpoint::request_access_token;
use crate::auth::oauth::AuthQuery;
use crate::auth::Session;
use crate::config::{ShopDomain, ShopifyConfig};

#[derive(serde::Serialize)]
struct AuthorizationCodeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Validates an OAuth callback and exchanges its code for an access token.
///
/// The steps, in order:
///
/// 1. the `hmac` parameter must match (primary secret, then old secret)
/// 2. `state` must equal `expected_state` (constant-time)
/// 3. `shop` must be a valid shop domain
/// 4. the code is POSTed to `/admin/oauth/access_token`
///
/// The returned session is online if Shopify answered with an
/// `associated_user`, and carries `expected_state` as its state.
///
/// # Errors
///
/// - [`OAuthError::InvalidHmac`]: HMAC signature validation failed
/// - [`OAuthError::StateMismatch`]: state parameter doesn't match
/// - [`OAuthError::InvalidCallback`]: shop domain is invalid or code is missing
/// - [`OAuthError::TokenExchangeFailed`]: the token endpoint failed
pub async fn validate_auth_callback(
    config: &ShopifyConfig,
    auth_query: &AuthQuery,
    expected_state: &str,
) -> Result<Session, OAuthError> {
    if !validate_hmac(auth_query, config) {
        return Err(OAuthError::InvalidHmac);
    }

    if !constant_time_compare(auth_query.state(), expected_state) {
        return Err(OAuthError::StateMismatch {
            expected: expected_state.to_string(),
            received: auth_query.state().to_string(),
        });
    }

    let shop = ShopDomain::new(auth_query.shop()).map_err(|_| OAuthError::InvalidCallback {
        reason: format!("Invalid shop domain: {}", auth_query.shop()),
    })?;

    if auth_query.code().is_empty() {
        return Err(OAuthError::InvalidCallback {
            reason: "Missing authorization code".to_string(),
        });
    }

    let request_body = AuthorizationCodeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code: auth_query.code(),
    };

    let token_response = request_access_token(config, &shop, &request_body)
        .await
        .map_err(|failure| OAuthError::TokenExchangeFailed {
            status: failure.status,
            message: failure.body,
        })?;

    let mut session = Session::from_access_token_response(shop, &token_response);
    session.state = Some(expected_state.to_string());

    Ok(session)
}
