//! HTTP client for Admin API communication.
//!
//! This module provides the [`HttpClient`] type for making authenticated
//! requests to a shop's Admin API. Each request is attempted once.

use std::collections::HashMap;

use crate::auth::Session;
use crate::clients::errors::{HttpError, HttpResponseError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::ShopifyConfig;

/// Library version from Cargo.toml.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for making requests to the Admin API.
///
/// The client handles:
/// - Base URI construction from the session's shop or the configured `api_host`
/// - Default headers including User-Agent and access token
/// - Shopify-specific error serialization
///
/// # Example
///
/// ```rust,ignore
/// use shopify_app::clients::{HttpClient, HttpRequest, HttpMethod};
///
/// let client = HttpClient::new("/admin/api/2026-01", &session, Some(&config));
///
/// let request = HttpRequest::builder(HttpMethod::Get, "shop.json")
///     .build()
///     .unwrap();
///
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    /// Base URI (e.g., `https://my-store.myshopify.com`).
    base_uri: String,
    /// Base path (e.g., "/admin/api/2026-01").
    base_path: String,
    default_headers: HashMap<String, String>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client for the given session.
    ///
    /// # Arguments
    ///
    /// * `base_path` - The base path for API requests (e.g., "/admin/api/2026-01")
    /// * `session` - The session providing shop domain and access token
    /// * `config` - Optional configuration for `api_host` and `user_agent_prefix`
    #[must_use]
    pub fn new(
        base_path: impl Into<String>,
        session: &Session,
        config: Option<&ShopifyConfig>,
    ) -> Self {
        let base_uri = config.map_or_else(
            || format!("https://{}", session.shop.as_ref()),
            |c| c.shop_base_url(&session.shop),
        );

        let user_agent_prefix = config
            .and_then(ShopifyConfig::user_agent_prefix)
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}Shopify App Library v{LIBRARY_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        // Proxied hosts still need to know which shop is addressed
        if config.and_then(ShopifyConfig::api_host).is_some() {
            default_headers.insert("Host".to_string(), session.shop.as_ref().to_string());
        }

        if !session.access_token.is_empty() {
            default_headers.insert(
                "X-Shopify-Access-Token".to_string(),
                session.access_token.clone(),
            );
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_uri,
            base_path: base_path.into(),
            default_headers,
        }
    }

    /// Returns the base URI for this client.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the base path for this client.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Sends an HTTP request to the Admin API.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error occurs (`Network`)
    /// - Non-2xx response received (`Response`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = format!("{}{}/{}", self.base_uri, self.base_path, request.path);

        let mut headers = self.default_headers.clone();
        if let Some(body_type) = &request.body_type {
            headers.insert(
                "Content-Type".to_string(),
                body_type.as_content_type().to_string(),
            );
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut req_builder = match request.http_method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }
        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.to_string());
        }

        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await.unwrap_or_default();

        let body = if body_text.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&body_text)
                .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }))
        };

        let response = HttpResponse::new(code, res_headers, body);

        if let Some(reason) = response.deprecation_reason() {
            tracing::warn!(
                "Deprecated request to Shopify API at {}, received reason: {}",
                request.path,
                reason
            );
        }

        if response.is_ok() {
            return Ok(response);
        }

        Err(HttpError::Response(HttpResponseError {
            code,
            message: Self::serialize_error(&response),
            error_reference: response.request_id().map(String::from),
        }))
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Serializes an error response to a JSON message.
    fn serialize_error(response: &HttpResponse) -> String {
        let mut error_body = serde_json::Map::new();

        for key in ["errors", "error", "raw_body"] {
            if let Some(value) = response.body.get(key) {
                error_body.insert(key.to_string(), value.clone());
            }
        }
        if response.body.get("error").is_some() {
            if let Some(desc) = response.body.get("error_description") {
                error_body.insert("error_description".to_string(), desc.clone());
            }
        }

        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::to_string(&error_body).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScopes;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
    use serde_json::json;

    fn create_test_session() -> Session {
        Session::new(
            "test-session".to_string(),
            ShopDomain::new("test-shop").unwrap(),
            "test-access-token".to_string(),
            AuthScopes::new(),
            false,
            None,
        )
    }

    fn config_builder() -> crate::config::ShopifyConfigBuilder {
        ShopifyConfig::builder()
            .api_key(ApiKey::new("test-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .app_url(HostUrl::new("https://myapp.example.com").unwrap())
    }

    #[test]
    fn test_client_construction_with_session() {
        let session = create_test_session();
        let client = HttpClient::new("/admin/api/2026-01", &session, None);

        assert_eq!(client.base_uri(), "https://test-shop.myshopify.com");
        assert_eq!(client.base_path(), "/admin/api/2026-01");
        assert!(client.default_headers().get("Host").is_none());
    }

    #[test]
    fn test_api_host_overrides_base_uri_and_sets_host_header() {
        let session = create_test_session();
        let config = config_builder()
            .api_host(HostUrl::new("http://127.0.0.1:8080").unwrap())
            .build()
            .unwrap();

        let client = HttpClient::new("/admin/api/2026-01", &session, Some(&config));

        assert_eq!(client.base_uri(), "http://127.0.0.1:8080");
        assert_eq!(
            client.default_headers().get("Host"),
            Some(&"test-shop.myshopify.com".to_string())
        );
    }

    #[test]
    fn test_access_token_header_injection() {
        let session = create_test_session();
        let client = HttpClient::new("/admin/api/2026-01", &session, None);

        assert_eq!(
            client.default_headers().get("X-Shopify-Access-Token"),
            Some(&"test-access-token".to_string())
        );
    }

    #[test]
    fn test_no_access_token_header_when_empty() {
        let mut session = create_test_session();
        session.access_token = String::new();
        let client = HttpClient::new("/admin/api/2026-01", &session, None);

        assert!(client
            .default_headers()
            .get("X-Shopify-Access-Token")
            .is_none());
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let session = create_test_session();
        let config = config_builder().user_agent_prefix("MyApp/1.0").build().unwrap();

        let client = HttpClient::new("/admin/api/2026-01", &session, Some(&config));

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("MyApp/1.0 | "));
        assert!(user_agent.contains("Shopify App Library"));
    }

    #[test]
    fn test_serialize_error_keeps_errors_and_reference() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["req-1".to_string()]);
        let response = HttpResponse::new(
            500,
            headers,
            json!({"errors": [{"message": "Something went wrong!"}], "data": null}),
        );

        let message: serde_json::Value =
            serde_json::from_str(&HttpClient::serialize_error(&response)).unwrap();

        assert_eq!(message["errors"][0]["message"], "Something went wrong!");
        assert!(message.get("data").is_none());
        assert!(message["error_reference"]
            .as_str()
            .unwrap()
            .contains("req-1"));
    }
}
