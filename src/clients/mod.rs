//! HTTP client types for Admin API communication.
//!
//! - [`HttpClient`]: The async HTTP client for API communication
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`graphql::GraphqlClient`]: GraphQL client for the Admin API
//!
//! Requests are attempted once. A non-2xx status surfaces as
//! [`HttpError::Response`] carrying the status code and a JSON summary of the
//! response body.

mod errors;
pub mod graphql;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_client::{HttpClient, LIBRARY_VERSION};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;

pub use graphql::{GraphqlClient, GraphqlError};
