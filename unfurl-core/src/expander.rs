//! Resource expansion: replacing a stub with fetched data.
//!
//! Given the raw nested value of a selected field, the expander resolves the
//! target schema's descriptors, picks a strategy, builds arguments and calls
//! the fetch function. The output replaces the stub before the nested value
//! is dumped through the target schema.

use std::fmt;

use serde_json::Value;
use tracing::debug;
use unfurl_schema::{FetchKind, Schema};

use crate::arguments::{build_aggregate, build_each, build_one};
use crate::descriptor::{FetchDescriptor, FetchDescriptors};
use crate::error::{ExpandError, ExpandResult};
use crate::options::ExpandOptions;

/// How a nested value is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandStrategy {
    /// One `retrieve` call for a single resource.
    Retrieve,
    /// One `retrieve` call per item of a list.
    PerItem,
    /// One `batch` call for the whole list.
    Batch,
}

impl ExpandStrategy {
    /// Get the strategy name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::PerItem => "per_item",
            Self::Batch => "batch",
        }
    }

    /// Check if this is the batch strategy.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch)
    }
}

impl fmt::Display for ExpandStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expands nested stubs through the target schema's fetch declarations.
#[derive(Debug, Clone, Copy)]
pub struct ResourceExpander {
    prefer_batch: bool,
}

impl Default for ResourceExpander {
    fn default() -> Self {
        Self { prefer_batch: true }
    }
}

impl ResourceExpander {
    /// Create an expander that uses `batch` whenever it can.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expander from pass options.
    pub fn from_options(options: &ExpandOptions) -> Self {
        Self {
            prefer_batch: options.prefer_batch,
        }
    }

    /// Set whether plural fields use `batch` when it is declared.
    pub fn with_prefer_batch(mut self, prefer: bool) -> Self {
        self.prefer_batch = prefer;
        self
    }

    /// Pick the strategy for a plural or single field of `descriptors`' schema.
    ///
    /// Plural fields use `batch` when declared, unless batching is turned off
    /// and `retrieve` is available. Single fields always use `retrieve`.
    pub fn strategy(&self, descriptors: &FetchDescriptors, many: bool) -> ExpandStrategy {
        if !many {
            return ExpandStrategy::Retrieve;
        }
        match (&descriptors.batch, &descriptors.retrieve) {
            (Some(_), Some(_)) if self.prefer_batch => ExpandStrategy::Batch,
            (Some(_), None) => ExpandStrategy::Batch,
            _ => ExpandStrategy::PerItem,
        }
    }

    /// Expand `raw`, the stub value of a field targeting `schema`.
    ///
    /// A `null` stub is an absent relationship and stays `null`; an empty
    /// list stays empty. Neither calls a fetch function.
    pub fn expand(&self, schema: &Schema, many: bool, raw: &Value) -> ExpandResult<Value> {
        let descriptors = FetchDescriptors::resolve(schema)?;

        if raw.is_null() {
            debug!(schema = %schema.name, "null relationship, nothing to fetch");
            return Ok(Value::Null);
        }
        if many && raw.as_array().is_some_and(Vec::is_empty) {
            debug!(schema = %schema.name, "empty collection, nothing to fetch");
            return Ok(Value::Array(Vec::new()));
        }

        let strategy = self.strategy(&descriptors, many);
        debug!(schema = %schema.name, strategy = %strategy, many, "expanding resource");

        match strategy {
            ExpandStrategy::Batch => {
                let descriptor = require(schema, &descriptors, FetchKind::Batch)?;
                self.expand_batch(schema, descriptor, raw)
            }
            ExpandStrategy::PerItem => {
                let descriptor = require(schema, &descriptors, FetchKind::Retrieve)?;
                self.expand_each(schema, descriptor, raw)
            }
            ExpandStrategy::Retrieve => {
                let descriptor = require(schema, &descriptors, FetchKind::Retrieve)?;
                let arguments = build_one(raw, &descriptor.arguments)?;
                descriptor.invoke(schema.name(), &arguments)
            }
        }
    }

    fn expand_batch(
        &self,
        schema: &Schema,
        descriptor: &FetchDescriptor,
        raw: &Value,
    ) -> ExpandResult<Value> {
        let expected = raw.as_array().map_or(0, Vec::len);
        let arguments = build_aggregate(raw, &descriptor.arguments)?;
        let result = descriptor.invoke(schema.name(), &arguments)?;

        if result.as_array().map(Vec::len) != Some(expected) {
            return Err(ExpandError::invalid_batch_result(schema.name(), expected, &result));
        }
        debug!(schema = %schema.name, items = expected, "batch fetched");
        Ok(result)
    }

    fn expand_each(
        &self,
        schema: &Schema,
        descriptor: &FetchDescriptor,
        raw: &Value,
    ) -> ExpandResult<Value> {
        let items = build_each(raw, &descriptor.arguments)?
            .iter()
            .map(|arguments| descriptor.invoke(schema.name(), arguments))
            .collect::<ExpandResult<Vec<_>>>()?;
        debug!(schema = %schema.name, items = items.len(), "per-item fetched");
        Ok(Value::Array(items))
    }
}

fn require<'d>(
    schema: &Schema,
    descriptors: &'d FetchDescriptors,
    kind: FetchKind,
) -> ExpandResult<&'d FetchDescriptor> {
    descriptors
        .get(kind)
        .ok_or_else(|| ExpandError::missing_declaration(schema.name(), kind))
}
