//! The `/admin/oauth/access_token` endpoint shared by every grant.

use crate::auth::session::AccessTokenResponse;
use crate::config::{ShopDomain, ShopifyConfig};
use serde::Serialize;

/// A failed call to the token endpoint: HTTP status (0 when no response was
/// received) and the response body or failure description.
pub(super) struct TokenEndpointFailure {
    pub status: u16,
    pub body: String,
}

/// POSTs `body` as JSON to the shop's token endpoint.
pub(super) async fn request_access_token<B: Serialize + Sync>(
    config: &ShopifyConfig,
    shop: &ShopDomain,
    body: &B,
) -> Result<AccessTokenResponse, TokenEndpointFailure> {
    let token_url = format!("{}/admin/oauth/access_token", config.shop_base_url(shop));

    let response = reqwest::Client::new()
        .post(&token_url)
        .header("Accept", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| TokenEndpointFailure {
            status: 0,
            body: format!("Network error: {e}"),
        })?;

    let status = response.status().as_u16();

    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status, shop = %shop, "Token endpoint returned an error");
        return Err(TokenEndpointFailure { status, body });
    }

    response
        .json::<AccessTokenResponse>()
        .await
        .map_err(|e| TokenEndpointFailure {
            status,
            body: format!("Failed to parse token response: {e}"),
        })
}
