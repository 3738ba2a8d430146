//! Authentication types.
//!
//! - [`AuthScopes`]: a set of OAuth scopes with implied scope handling
//! - [`Session`]: an authenticated session, online or offline
//! - [`AssociatedUser`]: the staff member behind an online session
//! - [`cookies`]: signed session and OAuth state cookies
//! - [`oauth`]: OAuth, token exchange and session-token primitives
//!
//! # Example
//!
//! ```rust
//! use shopify_app::{Session, ShopDomain};
//!
//! let shop = ShopDomain::new("my-store").unwrap();
//! let offline_session = Session::new(
//!     Session::offline_id(&shop),
//!     shop,
//!     "access-token".to_string(),
//!     "read_products".parse().unwrap(),
//!     false,
//!     None,
//! );
//!
//! assert!(!offline_session.expired());
//! ```

mod associated_user;
pub mod cookies;
pub mod oauth;
mod scopes;
pub mod session;

pub use associated_user::AssociatedUser;
pub use scopes::AuthScopes;
pub use session::{AccessTokenResponse, Session};
