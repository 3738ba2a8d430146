//! HMAC-SHA256 signing and verification.
//!
//! Shopify signs OAuth callbacks with a hex-encoded HMAC of the query string.
//! The app signs its own cookies with a base64-encoded HMAC of the cookie
//! value. Both are keyed with the API secret, and verification falls back to
//! the old secret when one is configured.
//!
//! All comparisons are constant-time.
//!
//! # Example
//!
//! ```rust
//! use shopify_app::auth::oauth::hmac::{compute_signature, compute_signature_base64};
//!
//! let signature = compute_signature("code=abc&shop=example.myshopify.com", "secret");
//! assert_eq!(signature.len(), 64);
//!
//! let cookie_sig = compute_signature_base64(b"offline_example.myshopify.com", "secret");
//! assert_eq!(cookie_sig.len(), 44);
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::Write;
use subtle::ConstantTimeEq;

use crate::auth::oauth::AuthQuery;
use crate::config::ShopifyConfig;

type HmacSha256 = Hmac<Sha256>;

// HMAC accepts any key size, so this never panics
fn digest(message: &[u8], secret: &str) -> impl AsRef<[u8]> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes()
}

/// Computes a lowercase hex HMAC-SHA256 of `message`.
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    digest(message.as_bytes(), secret)
        .as_ref()
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// Computes a standard base64 HMAC-SHA256 of `message`.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    STANDARD.encode(digest(message, secret))
}

/// Compares two strings in constant time.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Validates the `hmac` parameter of an OAuth callback.
///
/// The primary secret is tried first, then the old secret if configured.
#[must_use]
pub fn validate_hmac(query: &AuthQuery, config: &ShopifyConfig) -> bool {
    let signable = query.to_signable_string();
    config.secret_keys().any(|secret| {
        constant_time_compare(&compute_signature(&signable, secret.as_ref()), query.hmac())
    })
}

/// Validates a base64 signature over `message`, with old-key fallback.
#[must_use]
pub fn validate_signature_base64(message: &[u8], signature: &str, config: &ShopifyConfig) -> bool {
    config.secret_keys().any(|secret| {
        constant_time_compare(&compute_signature_base64(message, secret.as_ref()), signature)
    })
}
