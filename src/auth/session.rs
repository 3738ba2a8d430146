//! Session records and session id derivation.
//!
//! A [`Session`] is what the authentication flow stores after OAuth or token
//! exchange and what it loads on every authenticated request. Its id encodes
//! how it was obtained:
//!
//! | Kind                      | Id                 |
//! |---------------------------|--------------------|
//! | offline                   | `offline_{shop}`   |
//! | online, from session token| `{shop}_{sub}`     |
//! | online, from OAuth        | `{shop}_{user_id}` |

use crate::auth::{AssociatedUser, AuthScopes};
use crate::config::ShopDomain;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session for a shop.
///
/// Sessions are either offline (app-level, one per shop) or online (tied to
/// the staff member who opened the app). Both kinds serialize with `serde`
/// so storage backends can persist them as JSON.
///
/// # Example
///
/// ```rust
/// use shopify_app::{Session, ShopDomain, AuthScopes};
///
/// let shop = ShopDomain::new("my-store").unwrap();
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "access-token".to_string(),
///     "read_products".parse().unwrap(),
///     false,
///     None,
/// );
///
/// assert_eq!(session.id, "offline_my-store.myshopify.com");
/// assert!(session.is_active(&"read_products".parse().unwrap()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    pub id: String,

    /// The shop this session is for.
    pub shop: ShopDomain,

    /// OAuth state the session was created with, if any.
    #[serde(default)]
    pub state: Option<String>,

    /// Whether this is an online (user-specific) session.
    pub is_online: bool,

    /// The OAuth scopes granted to this session.
    pub scopes: AuthScopes,

    /// When the access token expires, if it does.
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,

    /// The access token for API authentication.
    pub access_token: String,

    /// Refresh token for expiring offline tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// When the refresh token expires.
    #[serde(default)]
    pub refresh_token_expires: Option<DateTime<Utc>>,

    /// The staff member behind an online session.
    #[serde(default)]
    pub associated_user: Option<AssociatedUser>,

    /// The `sid` claim of the session token the session was created from.
    #[serde(default)]
    pub shopify_session_id: Option<String>,
}

impl Session {
    /// Creates a session from its parts.
    #[must_use]
    pub const fn new(
        id: String,
        shop: ShopDomain,
        access_token: String,
        scopes: AuthScopes,
        is_online: bool,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            shop,
            state: None,
            is_online,
            scopes,
            expires,
            access_token,
            refresh_token: None,
            refresh_token_expires: None,
            associated_user: None,
            shopify_session_id: None,
        }
    }

    /// Returns the id of the offline session for `shop`.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{}", shop.as_ref())
    }

    /// Returns the id of an online session for `shop` and a user id.
    ///
    /// `user_id` is the `sub` claim of a session token or the
    /// `associated_user.id` of an OAuth token response.
    #[must_use]
    pub fn online_id(shop: &ShopDomain, user_id: &str) -> String {
        format!("{}_{user_id}", shop.as_ref())
    }

    /// Builds a session from a token endpoint response.
    ///
    /// The response is online if it carries an `associated_user`.
    #[must_use]
    pub fn from_access_token_response(shop: ShopDomain, response: &AccessTokenResponse) -> Self {
        let now = Utc::now();
        let is_online = response.associated_user.is_some();
        let id = response.associated_user.as_ref().map_or_else(
            || Self::offline_id(&shop),
            |user| Self::online_id(&shop, &user.id.to_string()),
        );

        Self {
            id,
            shop,
            state: None,
            is_online,
            scopes: response.scope.parse().unwrap_or_default(),
            expires: response.expires_in.map(|secs| now + Duration::seconds(secs)),
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            refresh_token_expires: response
                .refresh_token_expires_in
                .map(|secs| now + Duration::seconds(secs)),
            associated_user: response.associated_user.clone(),
            shopify_session_id: None,
        }
    }

    /// Returns `true` if the access token has expired.
    ///
    /// Sessions without an expiration time never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if the refresh token has expired.
    #[must_use]
    pub fn refresh_token_expired(&self) -> bool {
        self.refresh_token_expires
            .is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if an expired offline session can be refreshed in place.
    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        !self.is_online
            && self.expired()
            && self.refresh_token.is_some()
            && !self.refresh_token_expired()
    }

    /// Returns `true` if the session can be used for requests requiring `scopes`.
    ///
    /// The access token must be non-empty and unexpired, and the granted
    /// scopes must cover the required ones.
    #[must_use]
    pub fn is_active(&self, scopes: &AuthScopes) -> bool {
        !self.access_token.is_empty() && !self.expired() && self.scopes.covers(scopes)
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

/// A successful response from `/admin/oauth/access_token`.
///
/// The same endpoint serves the authorization-code grant, token exchange and
/// token refresh; which optional fields are present depends on the grant and
/// on the requested token type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    /// The access token.
    pub access_token: String,

    /// Comma-separated granted scopes.
    #[serde(default)]
    pub scope: String,

    /// Seconds until the access token expires.
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Refresh token, for expiring offline tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Seconds until the refresh token expires.
    #[serde(default)]
    pub refresh_token_expires_in: Option<i64>,

    /// Scopes granted to the associated user, for online tokens.
    #[serde(default)]
    pub associated_user_scope: Option<String>,

    /// The user behind an online token.
    #[serde(default)]
    pub associated_user: Option<AssociatedUser>,
}
