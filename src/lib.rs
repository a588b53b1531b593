//! # Unfurl
//!
//! On-demand relationship expansion for tree-shaped resource serialization.
//!
//! Unfurl provides:
//! - Schemas whose nested fields hold stubs (`{"id": 4}`) that can be
//!   replaced by the full resource at serialization time
//! - Caller-supplied `retrieve` and `batch` fetch functions per schema
//! - Per-request expand paths (`orders.items`) propagated level by level
//! - Batched fetching of plural relationships with one call
//!
//! ## Quick Start
//!
//! ```rust
//! use unfurl::prelude::*;
//! use serde_json::json;
//!
//! fn get_customer(args: &Arguments) -> FetchResult {
//!     Ok(Fetched::value(json!({ "id": args["id"], "name": "Ada" })))
//! }
//!
//! let registry = SchemaRegistry::new()
//!     .with(
//!         Schema::builder("Customer")
//!             .field(Field::int("id"))
//!             .field(Field::string("name"))
//!             .retrieve(get_customer, ["id"])
//!             .build()?,
//!     )?
//!     .with(
//!         Schema::builder("Order")
//!             .field(Field::int("id"))
//!             .field(Field::expandable("customer", "Customer"))
//!             .build()?,
//!     )?;
//!
//! let order = json!({ "id": 1, "customer": { "id": 7 } });
//! let out = Serializer::for_name(&registry, "Order")?
//!     .with_expand(ExpandSelection::parse("customer").to_paths())
//!     .dump(&order)?;
//!
//! assert_eq!(out["customer"]["name"], "Ada");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema declarations, registry and configuration.
pub mod schema {
    pub use unfurl_schema::*;
}

/// Expansion engine and serializer.
pub mod engine {
    pub use unfurl_core::*;
}

/// Logging setup.
pub use unfurl_core::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::{
        ErrorCode, ExpandError, ExpandOptions, ExpandResult, ExpandSelection, Serializer,
    };
    pub use crate::schema::{
        ArgumentSpec, Arguments, BoxError, FetchResult, Fetched, Field, Interactor, Schema,
        SchemaRef, SchemaRegistry, UnfurlConfig,
    };
}

// Re-export key types at the crate root
pub use engine::{ExpandError, Serializer};
pub use schema::{Schema, SchemaError, SchemaRegistry};
