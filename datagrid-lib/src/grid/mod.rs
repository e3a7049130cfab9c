//! The client-side data pipeline
//!
//! A [`GridView`] turns a fetched collection into the rows on screen:
//! filter ([`filter`]), sort by an inferred column type ([`sort`],
//! [`inference`]), then cut out the current page ([`page`]).

mod config;
pub mod filter;
pub mod inference;
pub mod page;
pub mod sort;
mod view;

pub use config::*;
pub use filter::Filter;
pub use filter::FilterValue;
pub use inference::ColumnType;
pub use inference::ColumnTypeCache;
pub use page::Pagination;
pub use sort::SortDirection;
pub use sort::SortStatus;
pub use view::*;
