//! Registry of named schemas.
//!
//! Nested fields may point at their target by name so that schemas can
//! reference each other (or themselves) regardless of declaration order.
//! The registry resolves those names when a serializer descends into the
//! field.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::ast::{Schema, SchemaRef};
use crate::error::{SchemaError, SchemaResult};

/// Named schemas, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<SmolStr, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its own name.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<Arc<Schema>> {
        self.register_arc(Arc::new(schema))
    }

    /// Register an already shared schema.
    pub fn register_arc(&mut self, schema: Arc<Schema>) -> SchemaResult<Arc<Schema>> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::duplicate("schema", schema.name()));
        }
        tracing::trace!(schema = %schema.name, fields = schema.fields.len(), "registered schema");
        self.schemas.insert(schema.name.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Register a schema, builder style.
    pub fn with(mut self, schema: Schema) -> SchemaResult<Self> {
        self.register(schema)?;
        Ok(self)
    }

    /// Get a schema by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Check if a schema is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Resolve a reference from a field declared on `current`.
    pub fn resolve(&self, target: &SchemaRef, current: &Arc<Schema>) -> SchemaResult<Arc<Schema>> {
        match target {
            SchemaRef::Named(name) => self
                .schemas
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| SchemaError::unknown_schema(name.as_str())),
            SchemaRef::Direct(schema) => Ok(Arc::clone(schema)),
            SchemaRef::SelfRef => Ok(Arc::clone(current)),
        }
    }

    /// Get all schemas.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.values()
    }

    /// Get the number of schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
