//! Configuration types for a Shopify admin app.
//!
//! This module provides the configuration the authentication flow is built
//! from: credentials, the public app URL, the scopes to request, and the
//! switches that select between the available authentication strategies.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ShopifyConfig`]: The main configuration struct holding all app settings
//! - [`ShopifyConfigBuilder`]: A builder for constructing [`ShopifyConfig`] instances
//! - [`ApiKey`]: A validated API key newtype
//! - [`ApiSecretKey`]: A validated API secret key newtype with masked debug output
//! - [`ShopDomain`]: A validated Shopify shop domain
//! - [`HostUrl`]: A validated absolute URL
//! - [`ApiVersion`]: The Admin API version to use
//! - [`AuthPaths`]: The routes reserved by the authentication flow
//! - [`FutureFlags`]: Opt-in behaviour switches
//!
//! # Example
//!
//! ```rust
//! use shopify_app::{ShopifyConfig, ApiKey, ApiSecretKey, ApiVersion, HostUrl};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .app_url(HostUrl::new("https://my-app.example.com").unwrap())
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//! ```

mod auth_paths;
mod future;
mod newtypes;
mod version;

pub use auth_paths::AuthPaths;
pub use future::{FutureFlag, FutureFlags};
pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use crate::auth::AuthScopes;
use crate::error::ConfigError;
use crate::logger::Logger;

/// Configuration for a Shopify admin app.
///
/// # Thread Safety
///
/// `ShopifyConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Key Rotation
///
/// The `old_api_secret_key` field supports seamless key rotation. Session
/// tokens, OAuth callbacks and signed cookies are verified with the primary
/// key first, then with the old key if configured.
///
/// # API host override
///
/// Outbound calls normally go to `https://{shop}`. Setting
/// [`api_host`](ShopifyConfigBuilder::api_host) sends them to that origin
/// instead, with the shop domain kept in the `Host` header. This is how the
/// crate's own tests point the flow at a mock server.
///
/// # Example
///
/// ```rust
/// use shopify_app::{ShopifyConfig, ApiKey, ApiSecretKey, HostUrl};
///
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("your-api-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("your-secret").unwrap())
///     .app_url(HostUrl::new("https://my-app.example.com").unwrap())
///     .is_embedded(true)
///     .build()
///     .unwrap();
///
/// assert!(config.is_embedded());
/// assert_eq!(config.auth_paths().callback_path(), "/auth/callback");
/// ```
#[derive(Clone, Debug)]
pub struct ShopifyConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    app_url: HostUrl,
    api_host: Option<HostUrl>,
    api_version: ApiVersion,
    is_embedded: bool,
    use_online_tokens: bool,
    auth_paths: AuthPaths,
    future_flags: FutureFlags,
    user_agent_prefix: Option<String>,
    logger: Logger,
}

impl ShopifyConfig {
    /// Creates a new builder for constructing a `ShopifyConfig`.
    #[must_use]
    pub fn builder() -> ShopifyConfigBuilder {
        ShopifyConfigBuilder::new()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the old API secret key, if configured.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the secret keys to try when verifying a signature, primary first.
    pub fn secret_keys(&self) -> impl Iterator<Item = &ApiSecretKey> {
        std::iter::once(&self.api_secret_key).chain(self.old_api_secret_key.as_ref())
    }

    /// Returns the OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the public URL of the app.
    #[must_use]
    pub const fn app_url(&self) -> &HostUrl {
        &self.app_url
    }

    /// Returns the API host override, if configured.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns the base URL for outbound calls to `shop`.
    ///
    /// This is `https://{shop}` unless an API host override is configured.
    #[must_use]
    pub fn shop_base_url(&self, shop: &ShopDomain) -> String {
        self.api_host.as_ref().map_or_else(
            || format!("https://{}", shop.as_ref()),
            |host| host.origin().to_string(),
        )
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.is_embedded
    }

    /// Returns whether the app requests online (per-user) access tokens.
    #[must_use]
    pub const fn use_online_tokens(&self) -> bool {
        self.use_online_tokens
    }

    /// Returns the routes reserved by the authentication flow.
    #[must_use]
    pub const fn auth_paths(&self) -> &AuthPaths {
        &self.auth_paths
    }

    /// Returns the enabled future flags.
    #[must_use]
    pub const fn future_flags(&self) -> &FutureFlags {
        &self.future_flags
    }

    /// Returns `true` if `flag` is enabled.
    #[must_use]
    pub fn is_enabled(&self, flag: FutureFlag) -> bool {
        self.future_flags.is_enabled(flag)
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the logger.
    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }
}

// Verify ShopifyConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyConfig>();
};

/// Builder for constructing [`ShopifyConfig`] instances.
///
/// Required fields are `api_key`, `api_secret_key` and `app_url`.
///
/// # Defaults
///
/// - `api_version`: Latest stable version
/// - `is_embedded`: `true`
/// - `use_online_tokens`: `false`
/// - `scopes`: Empty
/// - `auth_paths`: [`AuthPaths::default`]
/// - `future_flags`: none enabled
/// - `logger`: `tracing` at `Info`
/// - `api_host`, `user_agent_prefix`, `old_api_secret_key`: `None`
#[derive(Debug, Default)]
pub struct ShopifyConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    app_url: Option<HostUrl>,
    api_host: Option<HostUrl>,
    api_version: Option<ApiVersion>,
    is_embedded: Option<bool>,
    use_online_tokens: Option<bool>,
    auth_paths: Option<AuthPaths>,
    future_flags: Option<FutureFlags>,
    user_agent_prefix: Option<String>,
    logger: Option<Logger>,
}

impl ShopifyConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the old API secret key for key rotation support.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public URL of the app (required).
    #[must_use]
    pub fn app_url(mut self, url: HostUrl) -> Self {
        self.app_url = Some(url);
        self
    }

    /// Sends outbound shop calls to this origin instead of `https://{shop}`.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(mut self, embedded: bool) -> Self {
        self.is_embedded = Some(embedded);
        self
    }

    /// Sets whether online (per-user) access tokens are requested.
    #[must_use]
    pub const fn use_online_tokens(mut self, online: bool) -> Self {
        self.use_online_tokens = Some(online);
        self
    }

    /// Sets the routes reserved by the authentication flow.
    #[must_use]
    pub fn auth_paths(mut self, paths: AuthPaths) -> Self {
        self.auth_paths = Some(paths);
        self
    }

    /// Sets the enabled future flags.
    #[must_use]
    pub fn future_flags(mut self, flags: FutureFlags) -> Self {
        self.future_flags = Some(flags);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the logger.
    #[must_use]
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the [`ShopifyConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key`,
    /// `api_secret_key` or `app_url` are not set.
    pub fn build(self) -> Result<ShopifyConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let app_url = self
            .app_url
            .ok_or(ConfigError::MissingRequiredField { field: "app_url" })?;

        Ok(ShopifyConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            app_url,
            api_host: self.api_host,
            api_version: self.api_version.unwrap_or_else(ApiVersion::latest),
            is_embedded: self.is_embedded.unwrap_or(true),
            use_online_tokens: self.use_online_tokens.unwrap_or(false),
            auth_paths: self.auth_paths.unwrap_or_default(),
            future_flags: self.future_flags.unwrap_or_default(),
            user_agent_prefix: self.user_agent_prefix,
            logger: self.logger.unwrap_or_default(),
        })
    }
}
