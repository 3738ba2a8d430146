//! The Shopify staff member behind an online session.

use serde::{Deserialize, Serialize};

/// The user who authorized an online access token.
///
/// Shopify returns this object in the `associated_user` field of online
/// token responses. It is stored on the [`Session`](crate::Session) so that
/// handlers can tell which staff member is acting.
///
/// ```rust
/// use shopify_app::AssociatedUser;
///
/// let user: AssociatedUser = serde_json::from_str(r#"{
///     "id": 902541635,
///     "first_name": "John",
///     "last_name": "Smith",
///     "email": "john@example.com",
///     "email_verified": true,
///     "account_owner": true,
///     "locale": "en",
///     "collaborator": false
/// }"#).unwrap();
///
/// assert_eq!(user.id, 902541635);
/// assert!(user.account_owner);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedUser {
    /// The Shopify user ID.
    pub id: u64,

    /// First name.
    #[serde(default)]
    pub first_name: String,

    /// Last name.
    #[serde(default)]
    pub last_name: String,

    /// Email address.
    #[serde(default)]
    pub email: String,

    /// Whether the email address has been verified.
    #[serde(default)]
    pub email_verified: bool,

    /// Whether the user owns the shop.
    #[serde(default)]
    pub account_owner: bool,

    /// Locale preference, e.g. `en`.
    #[serde(default)]
    pub locale: String,

    /// Whether the user is a collaborator account.
    #[serde(default)]
    pub collaborator: bool,
}
