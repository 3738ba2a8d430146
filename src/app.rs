//! The object integrators hold on to.

use std::future::Future;
use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Request};
use thiserror::Error;

use crate::auth::oauth::StateParam;
use crate::authenticate::{self, AdminContext, AuthDecision, AuthStrategy};
use crate::config::{ShopDomain, ShopifyConfig};
use crate::redirect::sanitize_shop;
use crate::request::RequestContext;
use crate::response::{self, AuthResponse};
use crate::session_storage::{MemorySessionStorage, SessionStorage};

/// A configured Shopify app: config plus session storage.
///
/// Cheap to clone; share one instance across handlers, e.g. as `axum`
/// state.
///
/// # Example
///
/// ```rust
/// use shopify_app::{ApiKey, ApiSecretKey, HostUrl, ShopifyApp, ShopifyConfig};
///
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .app_url(HostUrl::new("https://my-app.example.com").unwrap())
///     .scopes("read_products".parse().unwrap())
///     .build()
///     .unwrap();
///
/// let app = ShopifyApp::with_memory_storage(config);
/// assert!(app.config().is_embedded());
/// ```
#[derive(Clone)]
pub struct ShopifyApp {
    config: Arc<ShopifyConfig>,
    storage: Arc<dyn SessionStorage>,
}

// Verify ShopifyApp is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyApp>();
};

impl std::fmt::Debug for ShopifyApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyApp")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ShopifyApp {
    /// Creates an app with the given session storage.
    #[must_use]
    pub fn new(config: ShopifyConfig, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            config: Arc::new(config),
            storage,
        }
    }

    /// Creates an app that keeps sessions in memory.
    #[must_use]
    pub fn with_memory_storage(config: ShopifyConfig) -> Self {
        Self::new(config, Arc::new(MemorySessionStorage::new()))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ShopifyConfig {
        &self.config
    }

    /// Returns the session storage.
    #[must_use]
    pub const fn session_storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Authenticates an admin request.
    ///
    /// On success the request may be served with the returned context.
    /// Otherwise the `Err` holds the response to send instead: a redirect,
    /// an App Bridge page, a `401` for the frontend, or an error status.
    /// Requests to the OAuth and App Bridge routes always end up here.
    pub fn authenticate_admin<B>(
        &self,
        request: &Request<B>,
    ) -> impl Future<Output = Result<AdminContext, AuthResponse>> + Send + '_ {
        let context = RequestContext::from_request(request);
        async move {
            let context = context?;
            self.authenticate_request(&context).await
        }
    }

    /// Same as [`ShopifyApp::authenticate_admin`], from request parts.
    pub async fn authenticate_admin_parts(
        &self,
        parts: &Parts,
    ) -> Result<AdminContext, AuthResponse> {
        let context = RequestContext::from_parts(parts)?;
        self.authenticate_request(&context).await
    }

    /// Authenticates a request that has already been read into a
    /// [`RequestContext`].
    pub async fn authenticate_request(
        &self,
        request: &RequestContext,
    ) -> Result<AdminContext, AuthResponse> {
        if let Some(response) =
            authenticate::handle_routes(&self.config, self.storage.as_ref(), request).await?
        {
            return Err(response);
        }

        match self.decide(request).await? {
            AuthDecision::Proceed(context) => Ok(context),
            AuthDecision::Redirect(redirect) => Err(AuthResponse::from_redirect(
                &redirect,
                &self.config,
                &StateParam::new(),
            )),
        }
    }

    /// Runs the authentication decision without handling the library's
    /// routes or building a response.
    ///
    /// # Errors
    ///
    /// See [`authenticate::authenticate`].
    pub async fn decide(
        &self,
        request: &RequestContext,
    ) -> Result<AuthDecision, authenticate::AuthError> {
        authenticate::authenticate(&self.config, self.storage.as_ref(), request).await
    }

    /// Adds the `Link` and `Content-Security-Policy` headers document
    /// responses need.
    pub fn add_document_response_headers(&self, headers: &mut HeaderMap, shop: Option<&ShopDomain>) {
        response::add_document_response_headers(headers, &self.config, shop);
    }

    /// Handles the login page.
    ///
    /// `form_shop` is the `shop` field of a submitted login form; `GET`
    /// requests may pass the shop as a query parameter instead. The shop may
    /// be given as a bare store name, which is completed to
    /// `{name}.myshopify.com`.
    #[must_use]
    pub fn login(&self, request: &RequestContext, form_shop: Option<&str>) -> LoginOutcome {
        let shop = form_shop.or_else(|| request.query_param("shop"));

        if *request.method() == Method::GET && shop.is_none() {
            return LoginOutcome::ShowForm;
        }
        let Some(shop) = shop.map(str::trim).filter(|shop| !shop.is_empty()) else {
            return LoginOutcome::Invalid(LoginError::MissingShop);
        };

        let Some(shop) = sanitize_login_shop(shop) else {
            self.config
                .logger()
                .debug("Invalid shop on login", &[("shop", shop)]);
            return LoginOutcome::Invalid(LoginError::InvalidShop);
        };

        let location = if AuthStrategy::for_config(&self.config) == AuthStrategy::TokenExchange {
            format!(
                "https://admin.shopify.com/store/{}/oauth/install?client_id={}",
                shop.shop_name(),
                self.config.api_key().as_ref()
            )
        } else {
            format!(
                "{}{}?shop={}",
                self.config.app_url().as_ref(),
                self.config.auth_paths().path(),
                urlencoding::encode(shop.as_ref())
            )
        };

        self.config
            .logger()
            .info("Redirecting login request", &[("shop", shop.as_ref())]);
        LoginOutcome::Redirect(AuthResponse::redirect(&location))
    }
}

fn sanitize_login_shop(raw: &str) -> Option<ShopDomain> {
    let without_scheme = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    let trimmed = without_scheme.trim_end_matches('/');

    if trimmed.contains('.') {
        sanitize_shop(trimmed)
    } else {
        sanitize_shop(&format!("{trimmed}.myshopify.com"))
    }
}

/// Result of [`ShopifyApp::login`].
#[derive(Debug)]
pub enum LoginOutcome {
    /// Nothing submitted yet; render the login form.
    ShowForm,
    /// Send the merchant on to install or authorize the app.
    Redirect(AuthResponse),
    /// Render the form again with this error.
    Invalid(LoginError),
}

/// Why a login submission was rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    /// No shop was entered.
    #[error("Please enter your shop domain to log in")]
    MissingShop,
    /// The shop is not a valid Shopify domain.
    #[error("Please enter a valid shop domain to log in")]
    InvalidShop,
}
