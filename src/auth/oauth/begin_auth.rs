//! OAuth authorization URL generation.
//!
//! [`begin_auth_url`] is a pure function of its inputs: the same config,
//! shop, token kind and state always produce the same URL. Callers draw the
//! [`StateParam`] and persist it for the callback.

use crate::auth::oauth::state::StateParam;
use crate::config::{ShopDomain, ShopifyConfig};

/// Builds the Shopify authorization URL for `shop`.
///
/// ```text
/// https://{shop}/admin/oauth/authorize?client_id=..&scope=..
///     &redirect_uri={app_url}{callback_path}&state=..[&grant_options[]=per-user]
/// ```
///
/// `grant_options[]=per-user` is added for online tokens.
///
/// # Example
///
/// ```rust
/// use shopify_app::{ShopifyConfig, ApiKey, ApiSecretKey, ShopDomain, HostUrl};
/// use shopify_app::auth::oauth::{begin_auth_url, StateParam};
///
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .app_url(HostUrl::new("https://myapp.example.com").unwrap())
///     .scopes("read_products".parse().unwrap())
///     .build()
///     .unwrap();
///
/// let shop = ShopDomain::new("test-shop").unwrap();
/// let state = StateParam::from_raw("nonce");
/// let url = begin_auth_url(&config, &shop, false, &state);
///
/// assert_eq!(
///     url,
///     "https://test-shop.myshopify.com/admin/oauth/authorize?client_id=api-key\
///      &scope=read_products&redirect_uri=https%3A%2F%2Fmyapp.example.com%2Fauth%2Fcallback\
///      &state=nonce"
/// );
/// ```
#[must_use]
pub fn begin_auth_url(
    config: &ShopifyConfig,
    shop: &ShopDomain,
    is_online: bool,
    state: &StateParam,
) -> String {
    let redirect_uri = format!(
        "{}{}",
        config.app_url().as_ref(),
        config.auth_paths().callback_path()
    );

    let mut params = vec![
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];

    if is_online {
        params.push(("grant_options[]", "per-user".to_string()));
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "https://{}/admin/oauth/authorize?{}",
        shop.as_ref(),
        query_string
    )
}
