//! GraphQL-specific error types.
//!
//! Only HTTP-level failures are errors. GraphQL-level errors (user errors,
//! validation errors) come back with status 200 in the response body's
//! `errors` field and are left to the caller.

use crate::clients::HttpError;
use thiserror::Error;

/// Error type for GraphQL API operations.
///
/// # Example
///
/// ```rust
/// use shopify_app::clients::graphql::GraphqlError;
/// use shopify_app::clients::{HttpError, HttpResponseError};
///
/// let http_error = HttpError::Response(HttpResponseError {
///     code: 401,
///     message: r#"{"error":"Unauthorized"}"#.to_string(),
///     error_reference: None,
/// });
/// let graphql_error: GraphqlError = http_error.into();
/// assert_eq!(graphql_error.status(), Some(401));
/// ```
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl GraphqlError {
    /// Returns the HTTP status code, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpResponseError;

    #[test]
    fn test_graphql_error_http_variant_wraps_http_error() {
        let http_error = HttpError::Response(HttpResponseError {
            code: 404,
            message: r#"{"error":"Not Found"}"#.to_string(),
            error_reference: Some("abc-123".to_string()),
        });

        let graphql_error = GraphqlError::Http(http_error);

        assert!(graphql_error.to_string().contains("Not Found"));
        assert_eq!(graphql_error.status(), Some(404));
    }
}
