//! Field definitions.

use std::sync::Arc;

use smol_str::SmolStr;

use super::Schema;

/// Reference from a nested field to the schema of its target.
#[derive(Debug, Clone)]
pub enum SchemaRef {
    /// Resolved lazily through the registry.
    Named(SmolStr),
    /// A schema held directly.
    Direct(Arc<Schema>),
    /// The schema declaring the field.
    SelfRef,
}

impl SchemaRef {
    /// Name of the referenced schema, if it is known without resolving.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name.as_str()),
            Self::Direct(schema) => Some(schema.name()),
            Self::SelfRef => None,
        }
    }

    /// Check if this is a self reference.
    pub fn is_self(&self) -> bool {
        matches!(self, Self::SelfRef)
    }
}

impl From<&str> for SchemaRef {
    fn from(name: &str) -> Self {
        Self::Named(name.into())
    }
}

impl From<String> for SchemaRef {
    fn from(name: String) -> Self {
        Self::Named(name.into())
    }
}

impl From<Arc<Schema>> for SchemaRef {
    fn from(schema: Arc<Schema>) -> Self {
        Self::Direct(schema)
    }
}

impl From<Schema> for SchemaRef {
    fn from(schema: Schema) -> Self {
        Self::Direct(Arc::new(schema))
    }
}

/// A field that holds another schema's resource (or a list of them).
#[derive(Debug, Clone)]
pub struct NestedField {
    /// Target schema.
    pub target: SchemaRef,
    /// Whether the field holds a list of resources.
    pub many: bool,
    /// Whether the field may be replaced by a fetched resource.
    pub expandable: bool,
}

/// The kind of value a field holds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Integer.
    Int,
    /// Floating point number.
    Float,
    /// String.
    Str,
    /// Boolean.
    Bool,
    /// Any value, copied as-is.
    Raw,
    /// Nested resource.
    Nested(NestedField),
}

impl FieldKind {
    /// Get a short name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Bool => "bool",
            Self::Raw => "raw",
            Self::Nested(_) => "nested",
        }
    }
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct Field {
    /// External name (key in the serialized output).
    pub name: SmolStr,
    /// Key read from the resource, when it differs from `name`.
    pub attribute: Option<SmolStr>,
    /// Field kind.
    pub kind: FieldKind,
}

impl Field {
    /// Create a field of the given kind.
    pub fn new(name: impl Into<SmolStr>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            attribute: None,
            kind,
        }
    }

    /// Integer field.
    pub fn int(name: impl Into<SmolStr>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    /// Float field.
    pub fn float(name: impl Into<SmolStr>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    /// String field.
    pub fn string(name: impl Into<SmolStr>) -> Self {
        Self::new(name, FieldKind::Str)
    }

    /// Boolean field.
    pub fn boolean(name: impl Into<SmolStr>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    /// Field copied verbatim.
    pub fn raw(name: impl Into<SmolStr>) -> Self {
        Self::new(name, FieldKind::Raw)
    }

    /// Nested field that is never expanded.
    pub fn nested(name: impl Into<SmolStr>, target: impl Into<SchemaRef>) -> Self {
        Self::new(
            name,
            FieldKind::Nested(NestedField {
                target: target.into(),
                many: false,
                expandable: false,
            }),
        )
    }

    /// Nested field that can be expanded on request.
    pub fn expandable(name: impl Into<SmolStr>, target: impl Into<SchemaRef>) -> Self {
        Self::new(
            name,
            FieldKind::Nested(NestedField {
                target: target.into(),
                many: false,
                expandable: true,
            }),
        )
    }

    /// Mark a nested field as plural. No effect on scalar fields.
    pub fn many(mut self) -> Self {
        if let FieldKind::Nested(ref mut nested) = self.kind {
            nested.many = true;
        }
        self
    }

    /// Read the value from a different resource key.
    pub fn attribute(mut self, key: impl Into<SmolStr>) -> Self {
        self.attribute = Some(key.into());
        self
    }

    /// Key this field reads from the resource.
    pub fn source_key(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.name)
    }

    /// Get the nested definition, if this is a nested field.
    pub fn as_nested(&self) -> Option<&NestedField> {
        match self.kind {
            FieldKind::Nested(ref nested) => Some(nested),
            _ => None,
        }
    }

    /// Check if this is a nested field.
    pub fn is_nested(&self) -> bool {
        self.as_nested().is_some()
    }

    /// Check if this is a nested field that can be expanded.
    pub fn is_expandable(&self) -> bool {
        self.as_nested().is_some_and(|n| n.expandable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_field() {
        let field = Field::int("id");
        assert_eq!(field.name, "id");
        assert_eq!(field.source_key(), "id");
        assert!(!field.is_nested());
        assert_eq!(field.kind.as_str(), "int");
    }

    #[test]
    fn test_many_ignored_on_scalar() {
        let field = Field::string("title").many();
        assert!(matches!(field.kind, FieldKind::Str));
    }

    #[test]
    fn test_expandable_many() {
        let field = Field::expandable("items", "Item").many();
        let nested = field.as_nested().unwrap();
        assert!(nested.many);
        assert!(nested.expandable);
        assert_eq!(nested.target.name(), Some("Item"));
        assert!(field.is_expandable());
    }

    #[test]
    fn test_plain_nested_is_not_expandable() {
        let field = Field::nested("owner", SchemaRef::SelfRef);
        assert!(field.is_nested());
        assert!(!field.is_expandable());
        assert!(field.as_nested().unwrap().target.is_self());
    }

    #[test]
    fn test_attribute_override() {
        let field = Field::expandable("customer", "Customer").attribute("customer_ref");
        assert_eq!(field.name, "customer");
        assert_eq!(field.source_key(), "customer_ref");
    }
}
