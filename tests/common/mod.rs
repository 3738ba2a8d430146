//! Shared fixtures for the integration tests.
//!
//! Every test builds its own config, storage and recording logger; nothing is
//! shared between tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::Request;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use shopify_app::auth::oauth::hmac::compute_signature_base64;
use shopify_app::logger::{LogSeverity, LogSink, Logger};
use shopify_app::{
    ApiKey, ApiSecretKey, AuthScopes, HostUrl, MemorySessionStorage, RequestContext, Session,
    SessionStorage, ShopDomain, ShopifyApp, ShopifyConfig, ShopifyConfigBuilder,
};

pub const API_KEY: &str = "testApiKey";
pub const API_SECRET_KEY: &str = "testApiSecretKey";
pub const APP_URL: &str = "https://my-test-app.myshopify.io";
pub const TEST_SHOP: &str = "test-shop.myshopify.io";
pub const SHOPIFY_HOST: &str = "totally-real-host.myshopify.io";
pub const SCOPES: &str = "testScope";
pub const USER_ID: &str = "12345";

/// `SHOPIFY_HOST`, base64 encoded as Shopify sends it.
pub fn base64_host() -> String {
    STANDARD.encode(SHOPIFY_HOST)
}

pub fn shop() -> ShopDomain {
    ShopDomain::new(TEST_SHOP).unwrap()
}

/// Collects rendered log messages.
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(LogSeverity, String)>>,
}

impl LogSink for RecordingSink {
    fn log(&self, severity: LogSeverity, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

impl RecordingSink {
    pub fn entries(&self) -> Vec<(LogSeverity, String)> {
        self.entries.lock().unwrap().clone()
    }

    /// Returns `true` if a message at `severity` contains `needle`.
    pub fn contains(&self, severity: LogSeverity, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(s, message)| *s == severity && message.contains(needle))
    }
}

/// Config, storage and log recorder for one test.
pub struct TestApp {
    pub config: ShopifyConfig,
    pub storage: Arc<MemorySessionStorage>,
    pub logs: Arc<RecordingSink>,
}

/// Starts a config with the usual test values and a recording logger.
///
/// `api_host` points outbound Admin API and token calls at a mock server.
pub fn config_builder(api_host: Option<&str>) -> (ShopifyConfigBuilder, Arc<RecordingSink>) {
    let logs = Arc::new(RecordingSink::default());
    let mut builder = ShopifyConfig::builder()
        .api_key(ApiKey::new(API_KEY).unwrap())
        .api_secret_key(ApiSecretKey::new(API_SECRET_KEY).unwrap())
        .app_url(HostUrl::new(APP_URL).unwrap())
        .scopes(SCOPES.parse().unwrap())
        .logger(Logger::new(LogSeverity::Debug, logs.clone()));
    if let Some(host) = api_host {
        builder = builder.api_host(HostUrl::new(host).unwrap());
    }
    (builder, logs)
}

impl TestApp {
    pub fn new(builder: ShopifyConfigBuilder, logs: Arc<RecordingSink>) -> Self {
        Self {
            config: builder.build().unwrap(),
            storage: Arc::new(MemorySessionStorage::new()),
            logs,
        }
    }

    /// Embedded app with default settings.
    pub fn embedded(api_host: Option<&str>) -> Self {
        let (builder, logs) = config_builder(api_host);
        Self::new(builder, logs)
    }

    /// Non-embedded app with default settings.
    pub fn non_embedded(api_host: Option<&str>) -> Self {
        let (builder, logs) = config_builder(api_host);
        Self::new(builder.is_embedded(false), logs)
    }

    pub fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    /// The facade over this test's config and storage.
    pub fn shopify_app(&self) -> ShopifyApp {
        ShopifyApp::new(self.config.clone(), self.storage.clone())
    }

    /// Stores a valid offline session for `TEST_SHOP` and returns it.
    pub async fn set_up_valid_session(&self) -> Session {
        let session = offline_session(TEST_SHOP, "123abc");
        self.storage.store_session(&session).await.unwrap();
        session
    }
}

pub fn offline_session(shop: &str, access_token: &str) -> Session {
    let shop = ShopDomain::new(shop).unwrap();
    Session::new(
        Session::offline_id(&shop),
        shop,
        access_token.to_string(),
        SCOPES.parse::<AuthScopes>().unwrap(),
        false,
        None,
    )
}

pub fn context(request: Request<()>) -> RequestContext {
    RequestContext::from_request(&request).unwrap()
}

/// A GET for `{APP_URL}{path_and_query}`.
pub fn get(path_and_query: &str) -> RequestContext {
    context(
        Request::get(format!("{APP_URL}{path_and_query}"))
            .body(())
            .unwrap(),
    )
}

/// Query for an embedded document request to `TEST_SHOP`.
pub fn embedded_query(id_token: Option<&str>) -> String {
    let mut query = format!("embedded=1&shop={TEST_SHOP}&host={}", base64_host());
    if let Some(token) = id_token {
        query.push_str(&format!("&id_token={token}"));
    }
    query
}

/// `Cookie` header value holding a signed cookie.
pub fn signed_cookie(name: &str, value: &str) -> String {
    let signature = compute_signature_base64(value.as_bytes(), API_SECRET_KEY);
    format!("{name}={value}; {name}.sig={signature}")
}

#[derive(Serialize)]
struct Claims {
    iss: String,
    dest: String,
    aud: String,
    sub: String,
    exp: i64,
    nbf: i64,
    iat: i64,
    jti: String,
    sid: String,
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Mints a session token for `shop`, signed with the test secret.
pub fn session_token(shop: &str) -> String {
    session_token_with(shop, API_SECRET_KEY)
}

pub fn session_token_with(shop: &str, secret: &str) -> String {
    let now = now();
    let claims = Claims {
        iss: format!("https://{shop}/admin"),
        dest: format!("https://{shop}"),
        aud: API_KEY.to_string(),
        sub: USER_ID.to_string(),
        exp: now + 3600,
        nbf: now - 10,
        iat: now,
        jti: format!("jti-{now}"),
        sid: "test-sid".to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Splits a URL's query into decoded pairs.
pub fn query_pairs(url: &str) -> Vec<(String, String)> {
    let query = url.split_once('?').map_or("", |(_, q)| q);
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

pub fn query_value(url: &str, key: &str) -> Option<String> {
    query_pairs(url)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}
