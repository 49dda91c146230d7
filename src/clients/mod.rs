//! API clients for the Shopify Admin API.

pub mod bulk;
mod errors;
pub mod graphql;

pub use errors::GraphqlError;
