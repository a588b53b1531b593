//! Registry validation.
//!
//! This module checks a registry for problems that would otherwise only
//! surface in the middle of a serialization pass:
//! - Named targets that are not registered
//! - Malformed `retrieve` / `batch` declarations
//! - `retrieve` and `batch` reading different source attributes
//!
//! Schemas embedded directly in a field are walked like registered ones.
//! Each schema is checked once, however many fields reach it.

use std::collections::HashSet;
use std::sync::Arc;

use crate::ast::{FetchKind, Schema, SchemaRef, check_consistency};
use crate::error::{SchemaError, SchemaResult};
use crate::registry::SchemaRegistry;

/// Validator for a schema registry.
#[derive(Debug)]
pub struct Validator {
    /// Collected validation errors.
    errors: Vec<SchemaError>,
    /// Schemas already checked in this run.
    visited: HashSet<*const Schema>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self {
            errors: vec![],
            visited: HashSet::new(),
        }
    }

    /// Validate every schema in the registry, collecting all errors.
    pub fn validate(&mut self, registry: &SchemaRegistry) -> SchemaResult<()> {
        self.errors.clear();
        self.visited.clear();

        for schema in registry.iter() {
            self.validate_schema(schema, registry);
        }
        self.visited.clear();

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed {
                count: self.errors.len(),
                errors: std::mem::take(&mut self.errors),
            })
        }
    }

    fn validate_schema(&mut self, schema: &Arc<Schema>, registry: &SchemaRegistry) {
        if !self.visited.insert(Arc::as_ptr(schema)) {
            return;
        }

        for field in schema.nested_fields() {
            let Some(nested) = field.as_nested() else {
                continue;
            };
            match &nested.target {
                SchemaRef::Named(name) if !registry.contains(name) => {
                    self.errors.push(SchemaError::invalid_field(
                        schema.name(),
                        field.name.as_str(),
                        format!("unknown target schema `{}`", name),
                    ));
                }
                SchemaRef::Direct(target) => self.validate_schema(target, registry),
                _ => {}
            }
        }

        self.validate_fetch(schema);
    }

    fn validate_fetch(&mut self, schema: &Schema) {
        for kind in [FetchKind::Retrieve, FetchKind::Batch] {
            if let Some(decl) = schema.meta.get(kind) {
                if let Err(e) = decl.check(schema.name(), kind) {
                    self.errors.push(e);
                }
            }
        }

        if let (Some(retrieve), Some(batch)) = (&schema.meta.retrieve, &schema.meta.batch) {
            if let Err(e) = check_consistency(schema.name(), retrieve, batch) {
                self.errors.push(e);
            }
        }
    }
}

/// Validate a registry.
pub fn validate_registry(registry: &SchemaRegistry) -> SchemaResult<()> {
    Validator::new().validate(registry)
}
