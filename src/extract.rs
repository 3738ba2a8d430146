//! `axum` extractor for authenticated admin requests.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::app::ShopifyApp;
use crate::authenticate::AdminContext;
use crate::response::AuthResponse;

/// Extracts an authenticated [`AdminContext`].
///
/// The router state must provide a [`ShopifyApp`] through [`FromRef`].
/// When the request cannot proceed, the extractor rejects with the
/// [`AuthResponse`] the client should receive, so the handler only runs for
/// authenticated requests.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{routing::get, Router};
/// use shopify_app::{AdminAuth, ShopifyApp};
///
/// async fn products(AdminAuth(admin): AdminAuth) -> String {
///     let response = admin
///         .admin()
///         .query("query { shop { name } }", None, None)
///         .await
///         .unwrap();
///     response.body["data"]["shop"]["name"].to_string()
/// }
///
/// let app: ShopifyApp = /* ... */;
/// let router = Router::new()
///     .route("/app/products", get(products))
///     .with_state(app);
/// ```
#[derive(Debug)]
pub struct AdminAuth(pub AdminContext);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    ShopifyApp: FromRef<S>,
{
    type Rejection = AuthResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = ShopifyApp::from_ref(state);
        app.authenticate_admin_parts(parts).await.map(Self)
    }
}
