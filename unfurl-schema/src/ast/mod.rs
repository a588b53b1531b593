//! Declaration types for unfurl schemas.
//!
//! This module contains the types a caller uses to describe resources:
//! schemas, their fields, and the fetch declarations that make nested
//! fields expandable.

mod fetch;
mod field;
mod schema;

pub use fetch::*;
pub use field::*;
pub use schema::*;
