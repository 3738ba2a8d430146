//! # Shopify App for axum
//!
//! Shopify's app authentication protocol wired into the request lifecycle of
//! an `axum` application.
//!
//! ## Overview
//!
//! For every admin request the crate decides whether a valid session exists,
//! whether the app is running inside the Shopify admin, and which redirect
//! recovers when it cannot proceed yet:
//!
//! - OAuth authorization-code flow with signed state cookies, via the
//!   `/auth` and `/auth/callback` routes
//! - Token exchange for embedded apps, behind
//!   [`FutureFlag::NewEmbeddedAuthStrategy`]
//! - Session-token validation for requests from the embedded frontend
//! - The App Bridge bounce and exit-iframe pages
//! - Refreshing expiring offline tokens, behind
//!   [`FutureFlag::ExpiringOfflineAccessTokens`]
//! - An Admin GraphQL client for the authenticated session
//!
//! Sessions live behind the [`SessionStorage`] trait;
//! [`MemorySessionStorage`] ships for development and tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_app::{ApiKey, ApiSecretKey, ApiVersion, HostUrl, ShopifyApp, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .app_url(HostUrl::new("https://your-app.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//!
//! let app = ShopifyApp::with_memory_storage(config);
//! ```
//!
//! ## Authenticating Requests
//!
//! With `axum`, put the app in the router state and take [`AdminAuth`] in
//! handlers. The library's own routes (`/auth/*`) must reach the extractor
//! too, so mount them with a handler that takes [`AdminAuth`]:
//!
//! ```rust,ignore
//! use axum::{routing::get, Router};
//! use shopify_app::{AdminAuth, ShopifyApp};
//!
//! async fn index(AdminAuth(admin): AdminAuth) -> String {
//!     format!("Hello {}", admin.session.shop)
//! }
//!
//! let router = Router::new()
//!     .route("/", get(index))
//!     .route("/auth/{*rest}", get(index))
//!     .with_state(app);
//! ```
//!
//! Outside `axum` extractors, call [`ShopifyApp::authenticate_admin`] and
//! send the `Err` response back as is.
//!
//! ## Lower Level
//!
//! [`authenticate::authenticate`] returns the bare [`AuthDecision`], and the
//! URL builders in [`redirect`] and the OAuth primitives in [`auth::oauth`]
//! are public for apps that need to assemble the flow differently.

pub mod app;
pub mod auth;
pub mod authenticate;
pub mod clients;
pub mod config;
pub mod error;
pub mod extract;
pub mod logger;
pub mod redirect;
pub mod request;
pub mod response;
pub mod session_storage;

// Re-export public types at crate root for convenience
pub use app::{LoginError, LoginOutcome, ShopifyApp};
pub use auth::{AssociatedUser, AuthScopes, Session};
pub use authenticate::{AdminContext, AuthDecision, AuthError, AuthStrategy, Redirect};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, AuthPaths, FutureFlag, FutureFlags, HostUrl, ShopDomain,
    ShopifyConfig, ShopifyConfigBuilder,
};
pub use error::ConfigError;
pub use extract::AdminAuth;
pub use logger::{LogSeverity, LogSink, Logger};
pub use request::RequestContext;
pub use response::AuthResponse;
pub use session_storage::{MemorySessionStorage, SessionStorage, SessionStorageError};

// Re-export HTTP client types
pub use clients::{
    GraphqlClient, GraphqlError, HttpClient, HttpError, HttpResponse, HttpResponseError,
};

// Re-export OAuth types for convenience
pub use auth::oauth::{
    begin_auth_url, exchange_offline_token, exchange_online_token, refresh_access_token,
    validate_auth_callback, AuthQuery, JwtPayload, OAuthError, StateParam,
};
