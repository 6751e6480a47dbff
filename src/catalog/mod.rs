//! External game catalog: query building, response mapping and the HTTP client.

pub mod client;
pub mod mapper;
pub mod model;
pub mod query;

pub use client::{CatalogClient, CatalogConfig};
pub use model::{Franchise, Game, Page, Platform, Studio};
pub use query::{GameFilter, ListingFilter, SortKey};
