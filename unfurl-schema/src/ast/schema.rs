//! Schema definitions and their builder.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::{ArgumentSpec, Arguments, FetchDeclaration, FetchKind, FetchResult, Field};
use crate::error::{SchemaError, SchemaResult};

/// Schema-level metadata: the optional fetch declarations.
#[derive(Debug, Clone, Default)]
pub struct SchemaMeta {
    /// Fetch one resource per call.
    pub retrieve: Option<FetchDeclaration>,
    /// Fetch a collection in one call.
    pub batch: Option<FetchDeclaration>,
}

impl SchemaMeta {
    /// Get a declaration by kind.
    pub fn get(&self, kind: FetchKind) -> Option<&FetchDeclaration> {
        match kind {
            FetchKind::Retrieve => self.retrieve.as_ref(),
            FetchKind::Batch => self.batch.as_ref(),
        }
    }

    /// Check if at least one declaration is present.
    pub fn has_fetch(&self) -> bool {
        self.retrieve.is_some() || self.batch.is_some()
    }
}

/// A schema: an ordered set of fields plus fetch metadata.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Schema name.
    pub name: SmolStr,
    /// Declared fields, in output order.
    pub fields: IndexMap<SmolStr, Field>,
    /// Fetch metadata.
    pub meta: SchemaMeta,
    /// Whether instances of this schema accept expand paths.
    pub expandable: bool,
}

impl Schema {
    /// Start building a schema.
    pub fn builder(name: impl Into<SmolStr>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Get the schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Check if a field is declared.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Get all nested fields.
    pub fn nested_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().filter(|f| f.is_nested())
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: SmolStr,
    fields: IndexMap<SmolStr, Field>,
    duplicates: Vec<SmolStr>,
    meta: SchemaMeta,
    expandable: bool,
}

impl SchemaBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            duplicates: Vec::new(),
            meta: SchemaMeta::default(),
            expandable: true,
        }
    }

    /// Add a field.
    pub fn field(mut self, field: Field) -> Self {
        if self.fields.contains_key(&field.name) {
            self.duplicates.push(field.name.clone());
        } else {
            self.fields.insert(field.name.clone(), field);
        }
        self
    }

    /// Add several fields.
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        for field in fields {
            self = self.field(field);
        }
        self
    }

    /// Declare the single-resource fetch function.
    pub fn retrieve<F, I>(mut self, function: F, arguments: I) -> Self
    where
        F: Fn(&Arguments) -> FetchResult + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<ArgumentSpec>,
    {
        self.meta.retrieve = Some(FetchDeclaration::new(function, arguments));
        self
    }

    /// Declare the collection fetch function.
    pub fn batch<F, I>(mut self, function: F, arguments: I) -> Self
    where
        F: Fn(&Arguments) -> FetchResult + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<ArgumentSpec>,
    {
        self.meta.batch = Some(FetchDeclaration::new(function, arguments));
        self
    }

    /// Set a prepared declaration.
    pub fn declare(mut self, kind: FetchKind, declaration: FetchDeclaration) -> Self {
        match kind {
            FetchKind::Retrieve => self.meta.retrieve = Some(declaration),
            FetchKind::Batch => self.meta.batch = Some(declaration),
        }
        self
    }

    /// Opt out of expansion: instances never accept expand paths and
    /// fields pointing here always stay stubs.
    pub fn plain(mut self) -> Self {
        self.expandable = false;
        self
    }

    /// Finish the schema.
    pub fn build(self) -> SchemaResult<Schema> {
        if let Some(name) = self.duplicates.first() {
            return Err(SchemaError::duplicate(
                "field",
                format!("{}.{}", self.name, name),
            ));
        }

        Ok(Schema {
            name: self.name,
            fields: self.fields,
            meta: self.meta,
            expandable: self.expandable,
        })
    }
}
