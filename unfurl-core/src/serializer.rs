//! The dump walk.
//!
//! A [`Serializer`] is one schema instance of a serialization pass. It walks
//! a resource depth-first, coerces scalar fields and hands nested values to
//! [`Serializer::prepare_nested`], which swaps a selected stub for fetched
//! data. Each nested value is then dumped by a child instance that holds a
//! reference to its parent and only the expand paths below its field.
//!
//! ```rust
//! use serde_json::json;
//! use unfurl_core::Serializer;
//! use unfurl_schema::{Arguments, FetchResult, Fetched, Field, Schema, SchemaRegistry};
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
//!
//! let plain = Serializer::for_name(&registry, "Order")?.dump(&order)?;
//! assert_eq!(plain, order);
//!
//! let expanded = Serializer::for_name(&registry, "Order")?
//!     .with_expand(["customer"])
//!     .dump(&order)?;
//! assert_eq!(expanded["customer"], json!({ "id": 7, "name": "Ada" }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use smol_str::SmolStr;
use tracing::debug;
use unfurl_schema::{Field, FieldKind, NestedField, Schema, SchemaRegistry, UnfurlConfig};

use crate::coerce::coerce;
use crate::error::{ExpandError, ExpandResult};
use crate::expander::ResourceExpander;
use crate::options::ExpandOptions;
use crate::selection::ExpandSelection;

/// One schema instance of a serialization pass.
#[derive(Debug, Clone)]
pub struct Serializer<'a> {
    registry: &'a SchemaRegistry,
    schema: Arc<Schema>,
    options: ExpandOptions,
    /// Paths as requested by the caller, kept so a change of options can
    /// recompute the selection.
    requested: Vec<String>,
    selection: Option<ExpandSelection>,
    parent: Option<&'a Serializer<'a>>,
    field: Option<SmolStr>,
}

impl<'a> Serializer<'a> {
    /// Create a root instance for `schema`.
    pub fn new(registry: &'a SchemaRegistry, schema: Arc<Schema>) -> Self {
        Self {
            registry,
            schema,
            options: ExpandOptions::default(),
            requested: Vec::new(),
            selection: None,
            parent: None,
            field: None,
        }
    }

    /// Create a root instance for the schema registered as `name`.
    pub fn for_name(registry: &'a SchemaRegistry, name: &str) -> ExpandResult<Self> {
        let schema = registry
            .get(name)
            .cloned()
            .ok_or_else(|| ExpandError::unknown_schema(name))?;
        Ok(Self::new(registry, schema))
    }

    /// Use the given pass options.
    ///
    /// Fails with [`ErrorCode::InvalidOptions`](crate::ErrorCode::InvalidOptions)
    /// for a zero depth limit or an empty separator.
    pub fn with_options(mut self, options: ExpandOptions) -> ExpandResult<Self> {
        options.validate().map_err(|e| e.with_schema(self.schema.name()))?;
        self.options = options;
        if self.selection.is_some() {
            self.configure();
        }
        Ok(self)
    }

    /// Use the options of an `unfurl.toml` configuration.
    pub fn with_config(self, config: &UnfurlConfig) -> ExpandResult<Self> {
        self.with_options(ExpandOptions::from(config))
    }

    /// Request expand paths, builder style.
    pub fn with_expand<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_expand(paths);
        self
    }

    /// Replace the requested expand paths and recompute the selection.
    pub fn set_expand<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested = paths.into_iter().map(Into::into).collect();
        self.configure();
    }

    fn configure(&mut self) {
        if !self.schema.expandable {
            if !self.requested.is_empty() {
                debug!(schema = %self.schema.name, "schema is not expandable, ignoring expand paths");
            }
            self.selection = Some(ExpandSelection::default());
            return;
        }
        let selection = ExpandSelection::with_options(&self.requested, &self.options)
            .restrict_to(&self.schema);
        debug!(
            schema = %self.schema.name,
            selected = ?selection.fields().collect::<Vec<_>>(),
            "expand selection configured"
        );
        self.selection = Some(selection);
    }

    /// The schema this instance serializes.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Pass options.
    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// The current selection, if expand paths were configured.
    pub fn selection(&self) -> Option<&ExpandSelection> {
        self.selection.as_ref()
    }

    /// Check if expand paths were configured.
    pub fn is_configured(&self) -> bool {
        self.selection.is_some()
    }

    /// The instance this one is nested under.
    pub fn parent(&self) -> Option<&Serializer<'a>> {
        self.parent
    }

    /// The root instance of the pass.
    pub fn root(&self) -> &Serializer<'a> {
        let mut current = self;
        while let Some(parent) = current.parent {
            current = parent;
        }
        current
    }

    /// Dotted path of this instance from the root, `None` at the root.
    pub fn path(&self) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(self);
        while let Some(instance) = current {
            if let Some(ref field) = instance.field {
                segments.push(field.as_str());
            }
            current = instance.parent;
        }
        if segments.is_empty() {
            return None;
        }
        segments.reverse();
        Some(segments.join(&self.options.separator))
    }

    /// Dotted path of one of this instance's fields.
    pub fn field_path(&self, field: &str) -> String {
        match self.path() {
            Some(path) => format!("{}{}{}", path, self.options.separator, field),
            None => field.to_string(),
        }
    }

    /// Check whether `field` is replaced by fetched data in this pass.
    ///
    /// The field must be an expandable nested field, selected at this level,
    /// and its target schema must accept expansion.
    pub fn should_expand(&self, field: &Field, target: &Schema) -> bool {
        field.is_expandable()
            && target.expandable
            && self
                .selection
                .as_ref()
                .is_some_and(|s| s.is_selected(&field.name))
    }

    /// Serialize a single resource.
    pub fn dump(&self, resource: &Value) -> ExpandResult<Value> {
        let object = resource
            .as_object()
            .ok_or_else(|| self.locate(ExpandError::not_a_mapping(resource)))?;

        let mut output = Map::with_capacity(self.schema.fields.len());
        for field in self.schema.fields.values() {
            let Some(raw) = object.get(field.source_key()) else {
                continue;
            };
            let value = match field.kind {
                FieldKind::Nested(ref nested) => self.dump_nested(field, nested, raw, object)?,
                ref kind => coerce(kind, raw).map_err(|e| {
                    e.with_field_if_unset(field.name.as_str())
                        .at(self.field_path(&field.name), self.schema.name())
                })?,
            };
            output.insert(field.name.to_string(), value);
        }

        Ok(Value::Object(output))
    }

    /// Serialize a list of resources.
    pub fn dump_many(&self, resources: &Value) -> ExpandResult<Value> {
        let items = resources
            .as_array()
            .ok_or_else(|| self.locate(ExpandError::not_iterable(resources)))?;
        items
            .iter()
            .map(|item| self.dump(item))
            .collect::<ExpandResult<Vec<_>>>()
            .map(Value::Array)
    }

    /// The nested-value hook: produce the value to serialize for `field`.
    ///
    /// `raw` is the stub read from `parent`, the resource being dumped. When
    /// the field is selected, the stub is replaced by fetched data; otherwise
    /// it is returned unchanged.
    pub fn prepare_nested(
        &self,
        field: &Field,
        raw: &Value,
        parent: &Map<String, Value>,
    ) -> ExpandResult<Value> {
        let Some(nested) = field.as_nested() else {
            return Ok(raw.clone());
        };
        let target = self.resolve(field, nested)?;
        let expanded = self.should_expand(field, &target);
        self.prepare_resolved(field, nested, &target, expanded, raw, parent)
    }

    fn prepare_resolved(
        &self,
        field: &Field,
        nested: &NestedField,
        target: &Schema,
        expanded: bool,
        raw: &Value,
        parent: &Map<String, Value>,
    ) -> ExpandResult<Value> {
        if !expanded {
            return Ok(raw.clone());
        }

        crate::unfurl_debug!(
            field = %field.name,
            parent_attributes = parent.len(),
            "preparing nested value"
        );
        debug!(
            schema = %self.schema.name,
            field = %field.name,
            target = %target.name,
            path = %self.field_path(&field.name),
            "expanding field"
        );
        ResourceExpander::from_options(&self.options)
            .expand(target, nested.many, raw)
            .map_err(|e| e.at(self.field_path(&field.name), target.name()))
    }

    fn dump_nested(
        &self,
        field: &Field,
        nested: &NestedField,
        raw: &Value,
        parent: &Map<String, Value>,
    ) -> ExpandResult<Value> {
        let target = self.resolve(field, nested)?;
        let expanded = self.should_expand(field, &target);
        let prepared = self.prepare_resolved(field, nested, &target, expanded, raw, parent)?;
        if prepared.is_null() {
            return Ok(Value::Null);
        }

        let child = self.child(field, target, expanded);
        if nested.many {
            child.dump_many(&prepared)
        } else {
            child.dump(&prepared)
        }
    }

    fn resolve(&self, field: &Field, nested: &NestedField) -> ExpandResult<Arc<Schema>> {
        self.registry
            .resolve(&nested.target, &self.schema)
            .map_err(|e| ExpandError::from(e).at(self.field_path(&field.name), self.schema.name()))
    }

    fn child<'s>(&'s self, field: &Field, target: Arc<Schema>, expanded: bool) -> Serializer<'s> {
        let selection = if expanded {
            self.selection
                .as_ref()
                .map(|s| s.child(&field.name).restrict_to(&target))
        } else {
            None
        };

        Serializer {
            registry: self.registry,
            schema: target,
            options: self.options.clone(),
            requested: Vec::new(),
            selection,
            parent: Some(self),
            field: Some(field.name.clone()),
        }
    }

    fn locate(&self, err: ExpandError) -> ExpandError {
        match self.path() {
            Some(path) => err.at(path, self.schema.name()),
            None if err.context.schema.is_none() => err.with_schema(self.schema.name()),
            None => err,
        }
    }
}
