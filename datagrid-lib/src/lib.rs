//! Headless data-grid core
//!
//! Fetches a record collection from a REST backend, keeps it in a shared
//! cache with optimistic create/update/delete, and turns it into the rows a
//! grid shows: tab-scoped query, filters, type-aware sort, pagination.

pub mod api;
pub mod auth;
pub mod error;
pub mod grid;
pub mod model;
pub mod response;
pub mod settings;
pub mod store;

mod client;

pub use client::*;
pub use response::CacheStatus;
pub use response::Response;
