//! Per-request view used by the authentication flow.

use std::collections::HashMap;

use axum::http::header::{AUTHORIZATION, COOKIE, HOST};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use cookie::Cookie;
use url::Url;

use crate::authenticate::AuthError;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";
const DEFAULT_SCHEME: &str = "https";

/// The parts of an incoming request the authentication flow looks at.
///
/// Built from `http` request parts. The URL is absolute: when the request
/// target is origin-form, scheme and host come from `X-Forwarded-Proto` /
/// `X-Forwarded-Host` or `Host`.
#[derive(Clone, Debug)]
pub struct RequestContext {
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
}

impl RequestContext {
    /// Builds a context from request parts.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidRequest`] if no absolute URL can be formed.
    pub fn from_parts(parts: &Parts) -> Result<Self, AuthError> {
        let url = Self::absolute_url(parts)?;
        let query = url.query_pairs().into_owned().collect();
        let cookies = parse_cookies(&parts.headers);

        Ok(Self {
            method: parts.method.clone(),
            url,
            query,
            headers: parts.headers.clone(),
            cookies,
        })
    }

    /// Builds a context from a whole request, ignoring its body.
    ///
    /// # Errors
    ///
    /// See [`RequestContext::from_parts`].
    pub fn from_request<B>(request: &axum::http::Request<B>) -> Result<Self, AuthError> {
        let mut builder = axum::http::Request::builder()
            .method(request.method().clone())
            .uri(request.uri().clone());
        if let Some(headers) = builder.headers_mut() {
            headers.clone_from(request.headers());
        }
        let (parts, ()) = builder
            .body(())
            .map_err(|e| AuthError::InvalidRequest {
                reason: e.to_string(),
            })?
            .into_parts();
        Self::from_parts(&parts)
    }

    fn absolute_url(parts: &Parts) -> Result<Url, AuthError> {
        let uri = &parts.uri;
        let raw = if uri.scheme().is_some() && uri.authority().is_some() {
            uri.to_string()
        } else {
            let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
            let scheme = header(FORWARDED_PROTO)
                .and_then(|v| v.split(',').next())
                .map_or(DEFAULT_SCHEME, str::trim);
            let host = header(FORWARDED_HOST)
                .or_else(|| header(HOST.as_str()))
                .unwrap_or("localhost");
            let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
            format!("{scheme}://{host}{path_and_query}")
        };

        Url::parse(&raw).map_err(|e| AuthError::InvalidRequest {
            reason: format!("Cannot build request URL from {raw}: {e}"),
        })
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Returns the query string including the leading `?`, or an empty
    /// string when there is none.
    #[must_use]
    pub fn search(&self) -> String {
        match self.url.query() {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        }
    }

    /// Returns the decoded query parameters in request order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the first value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request cookies by name. The first occurrence wins.
    #[must_use]
    pub const fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Returns the bearer token from the `Authorization` header.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Returns `true` for fetch requests from the embedded frontend, which
    /// authenticate with an `Authorization` header.
    #[must_use]
    pub fn is_xhr(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }

    /// Returns `true` if Shopify loaded this page inside the admin iframe.
    #[must_use]
    pub fn is_embedded_request(&self) -> bool {
        self.query_param("embedded") == Some("1")
    }
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(value).flatten() {
            cookies
                .entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value().to_string());
        }
    }
    cookies
}
