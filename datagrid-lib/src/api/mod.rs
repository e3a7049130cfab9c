//! REST access to record collections

mod backend;
mod params;
mod rest;

pub use backend::Backend;
pub use params::*;
