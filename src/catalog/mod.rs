//! Catalog query layer: token exchange and per-keyword track search.

mod client;
mod models;

pub use client::{CatalogClient, CatalogError, CatalogSearcher};
pub use models::{AccessToken, Track};
