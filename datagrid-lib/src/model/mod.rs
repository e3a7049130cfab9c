//! Typed models

mod entity;
mod field;
pub mod form;
mod record;

pub use entity::*;
pub use field::*;
pub use record::*;
