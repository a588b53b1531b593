//! # unfurl-schema
//!
//! Schema declarations for unfurl.
//!
//! This crate provides:
//! - Schema and field declarations, including expandable nested fields
//! - `retrieve` / `batch` fetch declarations attached to a schema
//! - A registry resolving schemas by name (and `SelfRef` to the declaring schema)
//! - Registry validation
//! - Configuration parser for `unfurl.toml` files
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use unfurl_schema::{Arguments, FetchResult, Fetched, Field, Schema, SchemaRegistry};
//!
//! fn get_customer(args: &Arguments) -> FetchResult {
//!     Ok(Fetched::value(json!({ "id": args["id"], "name": "Ada" })))
//! }
//!
//! let customer = Schema::builder("Customer")
//!     .field(Field::int("id"))
//!     .field(Field::string("name"))
//!     .retrieve(get_customer, ["id"])
//!     .build()
//!     .unwrap();
//!
//! let order = Schema::builder("Order")
//!     .field(Field::int("id"))
//!     .field(Field::expandable("customer", "Customer"))
//!     .build()
//!     .unwrap();
//!
//! let registry = SchemaRegistry::new().with(customer).unwrap().with(order).unwrap();
//! assert!(unfurl_schema::validate_registry(&registry).is_ok());
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod registry;
pub mod validator;

pub use ast::*;
pub use config::UnfurlConfig;
pub use error::{SchemaError, SchemaResult};
pub use registry::SchemaRegistry;
pub use validator::{Validator, validate_registry};
