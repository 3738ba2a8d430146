//! URL builders for the redirects issued by the authentication flow.
//!
//! Every function here is pure: the output depends only on the config, the
//! request and explicit arguments.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use url::form_urlencoded;

use crate::config::{ShopDomain, ShopifyConfig};
use crate::request::RequestContext;

/// Query parameter carrying the URL the bounce page reloads.
pub const RELOAD_PARAM: &str = "shopify-reload";

/// Query parameter carrying the top-level target of the exit-iframe page.
pub const EXIT_IFRAME_PARAM: &str = "exitIframe";

const ALLOWED_HOST_DOMAINS: [&str; 4] = [
    "myshopify.com",
    "shopify.com",
    "myshopify.io",
    "spin.dev",
];

/// Validates a `shop` parameter.
///
/// Only fully qualified shop domains (`*.myshopify.com`, `*.myshopify.io`) and
/// admin URLs (`admin.shopify.com/store/{name}`) are accepted.
///
/// ```rust
/// use shopify_app::redirect::sanitize_shop;
///
/// assert!(sanitize_shop("my-store.myshopify.com").is_some());
/// assert!(sanitize_shop("https://admin.shopify.com/store/my-store").is_some());
/// assert!(sanitize_shop("my-store").is_none());
/// assert!(sanitize_shop("my-store.example.com").is_none());
/// ```
#[must_use]
pub fn sanitize_shop(shop: &str) -> Option<ShopDomain> {
    if !shop.contains('.') {
        return None;
    }
    ShopDomain::new(shop).ok()
}

/// Decodes a base64 `host` parameter.
///
/// Returns the decoded host if it is valid UTF-8 and names a Shopify admin
/// host.
///
/// ```rust
/// use shopify_app::redirect::decode_host;
///
/// // "admin.shopify.com/store/my-store"
/// assert_eq!(
///     decode_host("YWRtaW4uc2hvcGlmeS5jb20vc3RvcmUvbXktc3RvcmU").as_deref(),
///     Some("admin.shopify.com/store/my-store")
/// );
/// assert_eq!(decode_host("not base64!"), None);
/// ```
#[must_use]
pub fn decode_host(host: &str) -> Option<String> {
    let trimmed = host.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD.decode(host))
        .ok()?;
    let decoded = String::from_utf8(bytes).ok()?;

    is_admin_host(&decoded).then_some(decoded)
}

/// Returns `host` unchanged if it decodes to a Shopify admin host.
#[must_use]
pub fn sanitize_host(host: &str) -> Option<&str> {
    decode_host(host).map(|_| host)
}

fn is_admin_host(decoded: &str) -> bool {
    let hostname = decoded.split('/').next().unwrap_or_default();
    let Some(first) = hostname.chars().next() else {
        return false;
    };
    if !first.is_ascii_alphanumeric() {
        return false;
    }
    let valid_chars = hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    valid_chars
        && ALLOWED_HOST_DOMAINS.iter().any(|domain| {
            hostname
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('.'))
        })
}

/// Replaces the first `key` pair and drops the rest, or appends `key` if it
/// is missing.
fn set_param(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    let mut value = Some(value);
    pairs.retain_mut(|(k, v)| {
        if k != key {
            return true;
        }
        value.take().map_or(false, |new_value| {
            *v = new_value;
            true
        })
    });
    if let Some(value) = value {
        pairs.push((key.to_string(), value));
    }
}

fn serialize(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Returns the URL of the bounce page that fetches a fresh session token.
///
/// The original request is reloaded through the configured app URL, so this
/// works behind proxies that rewrite `Host`:
///
/// ```text
/// {patch_session_token_path}?{query}&shopify-reload={app_url}{path}?{query}
/// ```
#[must_use]
pub fn bounce_page_url(config: &ShopifyConfig, request: &RequestContext) -> String {
    let reload = format!(
        "{}{}{}",
        config.app_url().as_ref(),
        request.path(),
        request.search()
    );

    let mut pairs = request.query_pairs().to_vec();
    set_param(&mut pairs, RELOAD_PARAM, reload);

    format!(
        "{}?{}",
        config.auth_paths().patch_session_token_path(),
        serialize(&pairs)
    )
}

/// Returns the exit-iframe URL that sends the top-level window to
/// `{auth.path}?shop={shop}`.
///
/// The request query is kept, with `shop` replaced. `host` is rewritten only
/// when it is a valid admin host; otherwise the incoming value stays as is.
#[must_use]
pub fn exit_iframe_url(
    config: &ShopifyConfig,
    request: &RequestContext,
    shop: &ShopDomain,
) -> String {
    let target = format!("{}?shop={}", config.auth_paths().path(), shop.as_ref());

    let mut pairs = request.query_pairs().to_vec();
    set_param(&mut pairs, "shop", shop.as_ref().to_string());

    if let Some(host) = request.query_param("host").and_then(sanitize_host) {
        let host = host.to_string();
        set_param(&mut pairs, "host", host);
    }

    set_param(&mut pairs, EXIT_IFRAME_PARAM, target);

    format!(
        "{}?{}",
        config.auth_paths().exit_iframe_path(),
        serialize(&pairs)
    )
}

/// Returns the app's URL inside the Shopify admin: `https://{host}/apps/{api_key}`.
///
/// `decoded_host` is the output of [`decode_host`].
#[must_use]
pub fn embedded_app_url(config: &ShopifyConfig, decoded_host: &str) -> String {
    format!(
        "https://{decoded_host}/apps/{}",
        config.api_key().as_ref()
    )
}

/// Returns the login page URL.
#[must_use]
pub fn login_url(config: &ShopifyConfig) -> String {
    config.auth_paths().login_path().to_string()
}

/// Returns the URL an XHR client should open to re-authorize:
/// `{app_url}{auth.path}?shop={shop}`.
#[must_use]
pub fn reauthorize_url(config: &ShopifyConfig, shop: &ShopDomain) -> String {
    format!(
        "{}{}?{}",
        config.app_url().as_ref(),
        config.auth_paths().path(),
        serialize(&[("shop".to_string(), shop.as_ref().to_string())])
    )
}
