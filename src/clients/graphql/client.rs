//! GraphQL client implementation for the Admin API.

use std::collections::HashMap;

use crate::auth::Session;
use crate::clients::graphql::GraphqlError;
use crate::clients::{DataType, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::config::{ApiVersion, ShopifyConfig};

/// GraphQL client for a shop's Admin API.
///
/// Requests go to `/admin/api/{version}/graphql.json` and are attempted once.
/// GraphQL-level errors arrive with HTTP 200 in `response.body["errors"]`;
/// only transport failures and non-2xx statuses are reported as errors.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_app::GraphqlClient;
///
/// let client = GraphqlClient::new(&session, Some(&config));
///
/// let response = client.query("query { shop { name } }", None, None).await?;
/// println!("Shop: {}", response.body["data"]["shop"]["name"]);
/// ```
#[derive(Debug)]
pub struct GraphqlClient {
    http_client: HttpClient,
    api_version: ApiVersion,
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient {
    /// Creates a new GraphQL client for the given session.
    ///
    /// Uses the API version from the configuration, or the latest stable
    /// version when no configuration is given.
    #[must_use]
    pub fn new(session: &Session, config: Option<&ShopifyConfig>) -> Self {
        let api_version = config.map_or_else(ApiVersion::latest, |c| c.api_version().clone());
        let base_path = format!("/admin/api/{api_version}");

        Self {
            http_client: HttpClient::new(base_path, session, config),
            api_version,
        }
    }

    /// Returns the API version being used by this client.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Executes a GraphQL query against the Admin API.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::Http`] for network errors and non-2xx
    /// responses.
    pub async fn query(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, GraphqlError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables
        });

        let mut builder = HttpRequest::builder(HttpMethod::Post, "graphql.json")
            .body(body)
            .body_type(DataType::Json);

        if let Some(extra_headers) = headers {
            builder = builder.extra_headers(extra_headers);
        }

        let request = builder.build().map_err(|e| GraphqlError::Http(e.into()))?;
        self.http_client.request(request).await.map_err(Into::into)
    }
}
