//! # unfurl-core
//!
//! Expansion engine for unfurl.
//!
//! This crate provides:
//! - Expand path selection and propagation through nested schema instances
//! - Argument building from one resource or a collection of them
//! - Fetch descriptor resolution and the retrieve/batch expansion strategies
//! - The depth-first dump walk with its nested-value hook
//! - Coded errors with the field path where they happened
//! - Logging setup driven by environment variables or `unfurl.toml`
//!
//! ## Expanding a collection
//!
//! A plural field whose target declares `batch` is fetched with one call:
//!
//! ```rust
//! use serde_json::{Value, json};
//! use unfurl_core::Serializer;
//! use unfurl_schema::{Arguments, FetchResult, Fetched, Field, Schema, SchemaRegistry};
//!
//! fn get_items(args: &Arguments) -> FetchResult {
//!     let items: Vec<Value> = args["ids"]
//!         .as_array()
//!         .into_iter()
//!         .flatten()
//!         .map(|id| json!({ "id": id, "sku": format!("sku-{}", id) }))
//!         .collect();
//!     Ok(Fetched::value(items))
//! }
//!
//! let registry = SchemaRegistry::new()
//!     .with(
//!         Schema::builder("Item")
//!             .field(Field::int("id"))
//!             .field(Field::string("sku"))
//!             .batch(get_items, [("ids", "id")])
//!             .build()?,
//!     )?
//!     .with(
//!         Schema::builder("Order")
//!             .field(Field::int("id"))
//!             .field(Field::expandable("items", "Item").many())
//!             .build()?,
//!     )?;
//!
//! let order = json!({ "id": 1, "items": [{ "id": 2 }, { "id": 3 }] });
//! let out = Serializer::for_name(&registry, "Order")?
//!     .with_expand(["items"])
//!     .dump(&order)?;
//!
//! assert_eq!(out["items"][1], json!({ "id": 3, "sku": "sku-3" }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! ```rust
//! use unfurl_core::{ErrorCode, ExpandError};
//!
//! let err = ExpandError::not_expandable("Tag").at("post.tags", "Tag");
//! assert_eq!(err.code, ErrorCode::NotExpandable);
//! assert!(err.is_configuration_error());
//! ```

pub mod arguments;
pub mod coerce;
pub mod descriptor;
pub mod error;
pub mod expander;
pub mod logging;
pub mod options;
pub mod selection;
pub mod serializer;

pub use arguments::{ArgumentMap, BuildMode, Built, build, build_aggregate, build_each, build_one};
pub use descriptor::{FetchDescriptor, FetchDescriptors};
pub use error::{ErrorCode, ErrorContext, ExpandError, ExpandResult};
pub use expander::{ExpandStrategy, ResourceExpander};
pub use options::ExpandOptions;
pub use selection::{ExpandSelection, parse_paths};
pub use serializer::Serializer;
