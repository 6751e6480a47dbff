//! Game discovery backend: catalog browsing, model-backed recommendations and
//! per-user collections behind an HTTP action surface.

pub mod advisor;
pub mod api;
pub mod catalog;
pub mod collections;
pub mod error;
pub mod tracing;

pub mod normalization {
    pub mod platform;
}

pub mod util {
    pub mod db;
    pub mod env;
}

pub use error::{FinderError, Result};
