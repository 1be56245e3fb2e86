//! Shopify Admin API integration.

mod admin;
mod graphql;
mod types;

pub use admin::AdminClient;
pub use types::*;
