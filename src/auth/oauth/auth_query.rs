//! OAuth callback query parameters.

use std::collections::BTreeMap;

/// The query string Shopify sends to the OAuth callback.
///
/// Every parameter except `hmac` takes part in the signature, so the query
/// keeps all of them rather than only the ones the flow reads.
///
/// ```rust
/// use shopify_app::auth::oauth::AuthQuery;
///
/// let query = AuthQuery::from_pairs([
///     ("code", "abc"),
///     ("shop", "my-store.myshopify.com"),
///     ("state", "nonce"),
///     ("timestamp", "1700000000"),
///     ("hmac", "ffff"),
/// ]);
///
/// assert_eq!(query.code(), "abc");
/// assert_eq!(query.hmac(), "ffff");
/// assert_eq!(
///     query.to_signable_string(),
///     "code=abc&shop=my-store.myshopify.com&state=nonce&timestamp=1700000000"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthQuery {
    params: BTreeMap<String, String>,
    hmac: String,
}

impl AuthQuery {
    /// Builds the query from decoded key/value pairs.
    ///
    /// `hmac` is split out; `signature` (a legacy parameter) is dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let key = key.into();
            match key.as_str() {
                "hmac" => query.hmac = value.into(),
                "signature" => {}
                _ => {
                    query.params.insert(key, value.into());
                }
            }
        }
        query
    }

    fn param(&self, key: &str) -> &str {
        self.params.get(key).map_or("", String::as_str)
    }

    /// The authorization code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.param("code")
    }

    /// The shop domain, unsanitized.
    #[must_use]
    pub fn shop(&self) -> &str {
        self.param("shop")
    }

    /// The OAuth state nonce echoed back by Shopify.
    #[must_use]
    pub fn state(&self) -> &str {
        self.param("state")
    }

    /// The base64-encoded admin host, if Shopify sent one.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.params.get("host").map(String::as_str)
    }

    /// The received signature.
    #[must_use]
    pub fn hmac(&self) -> &str {
        &self.hmac
    }

    /// Sets the signature.
    pub fn set_hmac(&mut self, hmac: impl Into<String>) {
        self.hmac = hmac.into();
    }

    /// Returns the form-encoded, key-sorted parameters the signature covers.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}
