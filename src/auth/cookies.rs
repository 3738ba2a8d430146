//! Signed cookies.
//!
//! Non-embedded apps remember the current session id in a cookie, and the
//! authorization-code flow keeps its state nonce in another. Each value is
//! accompanied by a `{name}.sig` cookie holding the base64 HMAC-SHA256 of the
//! value, keyed with the API secret. A value whose signature does not verify
//! (against the current or the old secret) reads as absent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

use crate::auth::oauth::hmac::{compute_signature_base64, validate_signature_base64};
use crate::config::ShopifyConfig;

/// Cookie holding the session id of a non-embedded app.
pub const SESSION_COOKIE_NAME: &str = "shopify_app_session";

/// Cookie holding the OAuth state nonce between begin-auth and the callback.
pub const STATE_COOKIE_NAME: &str = "shopify_app_state";

const STATE_COOKIE_MAX_AGE_SECS: i64 = 60;

/// Returns the name of the signature cookie for `name`.
#[must_use]
pub fn signature_cookie_name(name: &str) -> String {
    format!("{name}.sig")
}

/// Reads a cookie and verifies its signature.
///
/// Returns `None` if the cookie or its signature is missing, or if the
/// signature does not match.
#[must_use]
pub fn read_signed<'a>(
    cookies: &'a HashMap<String, String>,
    name: &str,
    config: &ShopifyConfig,
) -> Option<&'a str> {
    let value = cookies.get(name)?;
    let signature = cookies.get(&signature_cookie_name(name))?;

    validate_signature_base64(value.as_bytes(), signature, config).then_some(value.as_str())
}

/// Builds a value cookie and its signature cookie with shared attributes.
fn signed_pair(
    name: &str,
    value: &str,
    config: &ShopifyConfig,
    configure: impl Fn(Cookie<'static>) -> Cookie<'static>,
) -> [Cookie<'static>; 2] {
    let signature = compute_signature_base64(value.as_bytes(), config.api_secret_key().as_ref());
    let base = |name: String, value: String| {
        let mut cookie = Cookie::new(name, value);
        cookie.set_http_only(true);
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::Lax);
        configure(cookie)
    };

    [
        base(name.to_string(), value.to_string()),
        base(signature_cookie_name(name), signature),
    ]
}

/// Builds the signed session-id cookies for a non-embedded app.
///
/// The cookies expire with the session, or at the end of the browser session
/// if the session does not expire.
#[must_use]
pub fn session_cookies(
    session_id: &str,
    expires: Option<DateTime<Utc>>,
    config: &ShopifyConfig,
) -> [Cookie<'static>; 2] {
    let expires = expires.and_then(|at| OffsetDateTime::from_unix_timestamp(at.timestamp()).ok());

    signed_pair(SESSION_COOKIE_NAME, session_id, config, |mut cookie| {
        cookie.set_path("/");
        if let Some(at) = expires {
            cookie.set_expires(at);
        }
        cookie
    })
}

/// Builds the signed OAuth state cookies, scoped to the callback path.
#[must_use]
pub fn state_cookies(state: &str, config: &ShopifyConfig) -> [Cookie<'static>; 2] {
    let path = config.auth_paths().callback_path().to_string();

    signed_pair(STATE_COOKIE_NAME, state, config, |mut cookie| {
        cookie.set_path(path.clone());
        cookie.set_max_age(Duration::seconds(STATE_COOKIE_MAX_AGE_SECS));
        cookie
    })
}

/// Builds cookies that clear the OAuth state once the callback consumed it.
#[must_use]
pub fn expired_state_cookies(config: &ShopifyConfig) -> [Cookie<'static>; 2] {
    let path = config.auth_paths().callback_path().to_string();

    [
        STATE_COOKIE_NAME.to_string(),
        signature_cookie_name(STATE_COOKIE_NAME),
    ]
    .map(|name| {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path(path.clone());
        cookie.set_max_age(Duration::ZERO);
        cookie
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn config() -> ShopifyConfig {
        ShopifyConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .old_api_secret_key(ApiSecretKey::new("old-secret").unwrap())
            .app_url(HostUrl::new("https://app.example.com").unwrap())
            .build()
            .unwrap()
    }

    fn jar(cookies: &[Cookie<'static>]) -> HashMap<String, String> {
        cookies
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    #[test]
    fn test_session_cookies_read_back() {
        let config = config();
        let cookies = session_cookies("offline_test-shop.myshopify.com", None, &config);

        assert_eq!(cookies[1].name(), "shopify_app_session.sig");
        assert_eq!(cookies[0].path(), Some("/"));
        assert_eq!(
            read_signed(&jar(&cookies), SESSION_COOKIE_NAME, &config),
            Some("offline_test-shop.myshopify.com")
        );
    }

    #[test]
    fn test_tampered_value_reads_as_absent() {
        let config = config();
        let mut cookies = jar(&session_cookies("offline_a.myshopify.com", None, &config));
        cookies.insert(SESSION_COOKIE_NAME.to_string(), "offline_b.myshopify.com".to_string());

        assert_eq!(read_signed(&cookies, SESSION_COOKIE_NAME, &config), None);
    }

    #[test]
    fn test_missing_signature_reads_as_absent() {
        let config = config();
        let mut cookies = HashMap::new();
        cookies.insert(SESSION_COOKIE_NAME.to_string(), "offline_a.myshopify.com".to_string());

        assert_eq!(read_signed(&cookies, SESSION_COOKIE_NAME, &config), None);
    }

    #[test]
    fn test_signature_from_old_secret_is_accepted() {
        let config = config();
        let mut cookies = HashMap::new();
        cookies.insert(STATE_COOKIE_NAME.to_string(), "nonce".to_string());
        cookies.insert(
            signature_cookie_name(STATE_COOKIE_NAME),
            compute_signature_base64(b"nonce", "old-secret"),
        );

        assert_eq!(read_signed(&cookies, STATE_COOKIE_NAME, &config), Some("nonce"));
    }

    #[test]
    fn test_state_cookies_are_scoped_to_callback() {
        let config = config();
        let cookies = state_cookies("nonce", &config);

        assert_eq!(cookies[0].path(), Some("/auth/callback"));
        assert_eq!(cookies[0].max_age(), Some(Duration::seconds(60)));
        assert_eq!(cookies[0].same_site(), Some(SameSite::Lax));
        assert!(cookies[0].http_only().unwrap_or(false));
    }

    #[test]
    fn test_expired_state_cookies_clear_both() {
        let cookies = expired_state_cookies(&config());
        assert!(cookies
            .iter()
            .all(|c| c.value().is_empty() && c.max_age() == Some(Duration::ZERO)));
    }
}
