//! HTTP responses produced by the authentication flow.
//!
//! [`AuthResponse`] is what a handler sends back when a request may not
//! proceed: a redirect, an App Bridge page, a `401` telling the frontend to
//! re-authorize, or an error status. It implements
//! [`IntoResponse`](axum::response::IntoResponse).

use axum::http::header::{CONTENT_SECURITY_POLICY, CONTENT_TYPE, LINK, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use cookie::Cookie;

use crate::auth::cookies::state_cookies;
use crate::auth::oauth::{begin_auth_url, StateParam};
use crate::authenticate::{AuthError, Redirect};
use crate::config::{ShopDomain, ShopifyConfig};

/// App Bridge script served from Shopify's CDN.
pub const APP_BRIDGE_URL: &str = "https://cdn.shopify.com/shopifycloud/app-bridge.js";

/// Set on `401` responses to XHR requests whose session must be re-authorized.
pub const REAUTHORIZE_HEADER: HeaderName =
    HeaderName::from_static("x-shopify-api-request-failure-reauthorize");

/// Where the frontend should send the merchant to re-authorize.
pub const REAUTHORIZE_URL_HEADER: HeaderName =
    HeaderName::from_static("x-shopify-api-request-failure-reauthorize-url");

/// Set on `401` responses when the frontend should fetch a new session token
/// and retry.
pub const RETRY_INVALID_SESSION_HEADER: HeaderName =
    HeaderName::from_static("x-shopify-retry-invalid-session-request");

const HTML_CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// A response that ends an admin request early.
///
/// # Example
///
/// ```rust
/// use shopify_app::response::AuthResponse;
///
/// let response = AuthResponse::redirect("/auth/login");
/// assert_eq!(response.status().as_u16(), 302);
/// assert_eq!(response.location(), Some("/auth/login"));
/// ```
#[derive(Clone, Debug)]
pub struct AuthResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl AuthResponse {
    /// Creates an empty response with `status`.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// Creates a `302 Found` redirect to `location`.
    #[must_use]
    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new(StatusCode::FOUND);
        insert_header(&mut response.headers, LOCATION, location);
        response
    }

    /// Redirects to the shop's OAuth authorization page and sets the signed
    /// state cookies for the callback.
    #[must_use]
    pub fn begin_auth(
        config: &ShopifyConfig,
        shop: &ShopDomain,
        is_online: bool,
        state: &StateParam,
    ) -> Self {
        let mut response = Self::redirect(&begin_auth_url(config, shop, is_online, state));
        for cookie in state_cookies(state.as_ref(), config) {
            response = response.with_cookie(&cookie);
        }
        response
    }

    /// Turns a redirect decision into a response.
    ///
    /// `state` is only used by [`Redirect::BeginAuth`].
    #[must_use]
    pub fn from_redirect(redirect: &Redirect, config: &ShopifyConfig, state: &StateParam) -> Self {
        match redirect {
            Redirect::BeginAuth { shop, is_online } => {
                Self::begin_auth(config, shop, *is_online, state)
            }
            Redirect::ExitIframe { url }
            | Redirect::BouncePage { url }
            | Redirect::EmbeddedApp { url }
            | Redirect::Login { url } => Self::redirect(url),
            Redirect::Reauthorize { url } => {
                let mut response = Self::new(StatusCode::UNAUTHORIZED);
                response
                    .headers
                    .insert(REAUTHORIZE_HEADER, HeaderValue::from_static("1"));
                insert_header(&mut response.headers, REAUTHORIZE_URL_HEADER, url);
                response
            }
        }
    }

    /// Turns an error into a response with the error's status.
    ///
    /// Client errors other than `401` carry the error message as body. Server
    /// errors have an empty body.
    #[must_use]
    pub fn from_error(error: &AuthError) -> Self {
        let status = error.status();
        let mut response = Self::new(status);

        if let AuthError::InvalidSessionToken { retry: true } = error {
            response
                .headers
                .insert(RETRY_INVALID_SESSION_HEADER, HeaderValue::from_static("1"));
        }
        if status.is_client_error() && status != StatusCode::UNAUTHORIZED {
            response.body = error.to_string();
        }
        response
    }

    /// Renders the App Bridge page.
    ///
    /// Without `redirect_to` this is the session-token bounce page: App
    /// Bridge loads, fetches a session token and reloads the
    /// `shopify-reload` URL. With `redirect_to` the page also opens that URL
    /// in the top-level window, breaking out of the admin iframe.
    #[must_use]
    pub fn app_bridge_page(
        config: &ShopifyConfig,
        shop: Option<&ShopDomain>,
        redirect_to: Option<&str>,
    ) -> Self {
        let mut body = format!(
            r#"<script data-api-key="{}" src="{APP_BRIDGE_URL}"></script>"#,
            escape_attribute(config.api_key().as_ref())
        );
        if let Some(destination) = redirect_to {
            body.push_str(&format!(
                r#"<script>window.open({}, "_top")</script>"#,
                script_string(destination)
            ));
        }

        let mut response = Self::new(StatusCode::OK);
        response.body = body;
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        add_document_response_headers(&mut response.headers, config, shop);
        response
    }

    /// Adds a `Set-Cookie` header.
    #[must_use]
    pub fn with_cookie(mut self, cookie: &Cookie<'_>) -> Self {
        append_header(&mut self.headers, SET_COOKIE, &cookie.to_string());
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns mutable headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl From<AuthError> for AuthResponse {
    fn from(error: AuthError) -> Self {
        Self::from_error(&error)
    }
}

impl IntoResponse for AuthResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Adds the headers every document response of an app needs.
///
/// - `Link` preloads App Bridge when the shop is known.
/// - `Content-Security-Policy` lets the Shopify admin frame an embedded app,
///   and forbids framing otherwise.
///
/// ```rust
/// use axum::http::HeaderMap;
/// use shopify_app::{ApiKey, ApiSecretKey, HostUrl, ShopDomain, ShopifyConfig};
/// use shopify_app::response::add_document_response_headers;
///
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .app_url(HostUrl::new("https://my-app.example.com").unwrap())
///     .build()
///     .unwrap();
/// let shop = ShopDomain::new("my-store.myshopify.com").unwrap();
///
/// let mut headers = HeaderMap::new();
/// add_document_response_headers(&mut headers, &config, Some(&shop));
///
/// assert_eq!(
///     headers["content-security-policy"],
///     "frame-ancestors https://my-store.myshopify.com https://admin.shopify.com https://*.spin.dev;"
/// );
/// ```
pub fn add_document_response_headers(
    headers: &mut HeaderMap,
    config: &ShopifyConfig,
    shop: Option<&ShopDomain>,
) {
    if shop.is_some() {
        insert_header(
            headers,
            LINK,
            &format!(r#"<{APP_BRIDGE_URL}>; rel="preload"; as="script";"#),
        );
    }

    if !config.is_embedded() {
        headers.insert(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("frame-ancestors 'none';"),
        );
    } else if let Some(shop) = shop {
        insert_header(
            headers,
            CONTENT_SECURITY_POLICY,
            &format!(
                "frame-ancestors https://{} https://admin.shopify.com https://*.spin.dev;",
                shop.as_ref()
            ),
        );
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "Dropping header with invalid value"),
    }
}

fn append_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.append(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "Dropping header with invalid value"),
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// JSON string literal that cannot close the surrounding `<script>` element.
fn script_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn config(embedded: bool) -> ShopifyConfig {
        ShopifyConfig::builder()
            .api_key(ApiKey::new("api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .app_url(HostUrl::new("https://my-test-app.myshopify.io").unwrap())
            .is_embedded(embedded)
            .build()
            .unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::new("test-shop.myshopify.io").unwrap()
    }

    #[test]
    fn test_begin_auth_sets_location_and_state_cookies() {
        let config = config(true);
        let state = StateParam::from_raw("nonce");

        let response = AuthResponse::from_redirect(
            &Redirect::BeginAuth {
                shop: shop(),
                is_online: false,
            },
            &config,
            &state,
        );

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response
            .location()
            .unwrap()
            .starts_with("https://test-shop.myshopify.io/admin/oauth/authorize?"));
        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("shopify_app_state=nonce"));
        assert!(cookies[1].starts_with("shopify_app_state.sig="));
    }

    #[test]
    fn test_reauthorize_is_unauthorized_with_headers() {
        let response = AuthResponse::from_redirect(
            &Redirect::Reauthorize {
                url: "https://my-test-app.myshopify.io/auth?shop=test-shop.myshopify.io"
                    .to_string(),
            },
            &config(true),
            &StateParam::new(),
        );

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[REAUTHORIZE_HEADER], "1");
        assert_eq!(
            response.headers()[REAUTHORIZE_URL_HEADER],
            "https://my-test-app.myshopify.io/auth?shop=test-shop.myshopify.io"
        );
    }

    #[test]
    fn test_invalid_session_token_asks_for_retry() {
        let response = AuthResponse::from_error(&AuthError::InvalidSessionToken { retry: true });

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[RETRY_INVALID_SESSION_HEADER], "1");
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_server_errors_have_no_body() {
        let response = AuthResponse::from_error(&AuthError::Upstream {
            status: 500,
            message: "secret upstream detail".to_string(),
        });

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_bad_request_carries_message() {
        let response = AuthResponse::from_error(&AuthError::InvalidShop {
            shop: "nope".to_string(),
        });

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.body(), "Shop param is invalid: nope");
    }

    #[test]
    fn test_app_bridge_page_with_redirect() {
        let response = AuthResponse::app_bridge_page(
            &config(true),
            Some(&shop()),
            Some("https://my-test-app.myshopify.io/auth?shop=test-shop.myshopify.io"),
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
        assert_eq!(
            response.body(),
            r#"<script data-api-key="api-key" src="https://cdn.shopify.com/shopifycloud/app-bridge.js"></script><script>window.open("https://my-test-app.myshopify.io/auth?shop=test-shop.myshopify.io", "_top")</script>"#
        );
    }

    #[test]
    fn test_script_string_cannot_close_script_tag() {
        assert_eq!(
            script_string("/</script><script>alert(1)"),
            r#""/\u003c/script>\u003cscript>alert(1)""#
        );
    }

    #[test]
    fn test_document_headers_for_non_embedded_app() {
        let mut headers = HeaderMap::new();
        add_document_response_headers(&mut headers, &config(false), Some(&shop()));

        assert_eq!(headers[CONTENT_SECURITY_POLICY], "frame-ancestors 'none';");
        assert_eq!(
            headers[LINK],
            r#"<https://cdn.shopify.com/shopifycloud/app-bridge.js>; rel="preload"; as="script";"#
        );
    }

    #[test]
    fn test_document_headers_without_shop() {
        let mut headers = HeaderMap::new();
        add_document_response_headers(&mut headers, &config(true), None);

        assert!(headers.is_empty());
    }
}
