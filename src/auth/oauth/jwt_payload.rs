//! Shopify session token (JWT) decoding.
//!
//! App Bridge hands embedded apps a short-lived HS256 token signed with the
//! app's secret. The claims used by the authentication flow are:
//!
//! - `dest`: the shop URL, e.g. `https://shop.myshopify.com`
//! - `aud`: the app's API key
//! - `sub`: the staff member's user id
//! - `sid`: Shopify's session id
//!
//! Time-based claims (`exp`, `nbf`) are checked with a 10 second leeway, and
//! the old secret key is tried when the primary one fails.

use crate::auth::oauth::OAuthError;
use crate::config::{ShopDomain, ShopifyConfig};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

const JWT_LEEWAY_SECS: u64 = 10;

/// Decoded claims of a Shopify session token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwtPayload {
    /// Issuer, e.g. `https://shop.myshopify.com/admin`.
    pub iss: String,

    /// Destination shop URL.
    pub dest: String,

    /// Audience; must equal the API key.
    pub aud: String,

    /// Subject: the user id of the staff member.
    #[serde(default)]
    pub sub: Option<String>,

    /// Expiration (Unix timestamp).
    pub exp: i64,

    /// Not before (Unix timestamp).
    pub nbf: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Token id.
    #[serde(default)]
    pub jti: String,

    /// Shopify session id.
    #[serde(default)]
    pub sid: Option<String>,
}

impl JwtPayload {
    /// Decodes and validates a session token.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] if the signature, time claims or
    /// audience do not validate.
    pub fn decode(token: &str, config: &ShopifyConfig) -> Result<Self, OAuthError> {
        let mut last_error = None;
        let mut payload = None;

        for secret in config.secret_keys() {
            match Self::decode_with_key(token, secret.as_ref()) {
                Ok(claims) => {
                    payload = Some(claims);
                    break;
                }
                Err(err) => {
                    last_error.get_or_insert(err);
                }
            }
        }

        let payload = payload.ok_or_else(|| OAuthError::InvalidJwt {
            reason: last_error.map_or_else(
                || "Error decoding session token".to_string(),
                |err| format!("Error decoding session token: {err}"),
            ),
        })?;

        if payload.aud != config.api_key().as_ref() {
            return Err(OAuthError::InvalidJwt {
                reason: "Session token had invalid API key".to_string(),
            });
        }

        Ok(payload)
    }

    fn decode_with_key(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = JWT_LEEWAY_SECS;
        validation.validate_nbf = true;
        // aud is compared manually so the error says which check failed
        validation.validate_aud = false;

        let key = DecodingKey::from_secret(secret.as_bytes());
        decode::<Self>(token, &key, &validation).map(|data| data.claims)
    }

    /// Returns the shop named by the `dest` claim.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidJwt`] if `dest` is not a URL whose host is
    /// a valid shop domain.
    pub fn shop(&self) -> Result<ShopDomain, OAuthError> {
        let invalid = || OAuthError::InvalidJwt {
            reason: format!("Session token has invalid destination '{}'", self.dest),
        };

        let dest = url::Url::parse(&self.dest).map_err(|_| invalid())?;
        let host = dest.host_str().ok_or_else(invalid)?;
        ShopDomain::new(host).map_err(|_| invalid())
    }

    /// Returns the `sub` claim, if present and non-empty.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.sub.as_deref().filter(|sub| !sub.is_empty())
    }
}

// Verify JwtPayload is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<JwtPayload>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn config(secret: &str, old: Option<&str>) -> ShopifyConfig {
        let mut builder = ShopifyConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new(secret).unwrap())
            .app_url(HostUrl::new("https://app.example.com").unwrap());
        if let Some(old) = old {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old).unwrap());
        }
        builder.build().unwrap()
    }

    fn token(secret: &str, aud: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = json!({
            "iss": "https://test-shop.myshopify.io/admin",
            "dest": "https://test-shop.myshopify.io",
            "aud": aud,
            "sub": "12345",
            "exp": now + exp_offset,
            "nbf": now - 10,
            "iat": now,
            "jti": "jti",
            "sid": "sid",
        });
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let payload = JwtPayload::decode(&token("s", "test-api-key", 60), &config("s", None)).unwrap();

        assert_eq!(payload.shop().unwrap().as_ref(), "test-shop.myshopify.io");
        assert_eq!(payload.user_id(), Some("12345"));
        assert_eq!(payload.sid.as_deref(), Some("sid"));
    }

    #[test]
    fn test_decode_falls_back_to_old_secret() {
        let result = JwtPayload::decode(&token("old", "test-api-key", 60), &config("new", Some("old")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let result = JwtPayload::decode(&token("other", "test-api-key", 60), &config("s", None));
        assert!(matches!(result, Err(OAuthError::InvalidJwt { .. })));
    }

    #[test]
    fn test_decode_rejects_wrong_audience() {
        let result = JwtPayload::decode(&token("s", "someone-else", 60), &config("s", None));
        match result {
            Err(OAuthError::InvalidJwt { reason }) => assert!(reason.contains("invalid API key")),
            other => panic!("expected InvalidJwt, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_expired_token_beyond_leeway() {
        let result = JwtPayload::decode(&token("s", "test-api-key", -60), &config("s", None));
        assert!(result.is_err());

        let within_leeway = JwtPayload::decode(&token("s", "test-api-key", -5), &config("s", None));
        assert!(within_leeway.is_ok());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(JwtPayload::decode("not-a-jwt", &config("s", None)).is_err());
    }

    #[test]
    fn test_shop_rejects_foreign_destination() {
        let mut payload = JwtPayload::decode(&token("s", "test-api-key", 60), &config("s", None)).unwrap();
        payload.dest = "https://evil.example.com".to_string();
        assert!(payload.shop().is_err());
    }
}
