//! GraphQL client for the Shopify Admin API.
//!
//! The authentication flow uses [`GraphqlClient`] to check that a stored
//! offline token still works, and hands the same client to the application
//! inside the admin context.
//!
//! # Response Structure
//!
//! GraphQL responses contain these fields in the body:
//!
//! - `data`: The query result data
//! - `errors`: Any GraphQL errors (still HTTP 200)
//! - `extensions`: Query cost information

mod client;
mod errors;

pub use client::GraphqlClient;
pub use errors::GraphqlError;
