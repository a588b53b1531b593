//! Error types for expansion and serialization.
//!
//! Every error carries a code, a message and a context describing where in
//! the resource tree it happened:
//!
//! # Error Codes
//!
//! Error codes follow a pattern: E{category}{number}
//! - 1xxx: Schema configuration errors (not expandable, bad fetch declaration)
//! - 2xxx: Resource shape errors (missing attribute, not a list, not a mapping)
//! - 3xxx: Fetch errors (fetch function failed, bad batch result)
//! - 4xxx: Data errors (scalar coercion)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use unfurl_core::{ErrorCode, ExpandError};
//!
//! let err = ExpandError::missing_attribute("id").at("orders.items", "Item");
//! assert_eq!(err.code, ErrorCode::MissingAttribute);
//! assert_eq!(err.context.path.as_deref(), Some("orders.items"));
//! assert!(err.is_resource_error());
//! ```

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use unfurl_schema::{BoxError, FetchKind, SchemaError};

/// Result type for expansion operations.
pub type ExpandResult<T> = Result<T, ExpandError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Schema configuration errors (1xxx)
    /// Target schema declares neither `retrieve` nor `batch` (E1001).
    NotExpandable = 1001,
    /// Malformed fetch declaration (E1002).
    InvalidFetchDeclaration = 1002,
    /// Named schema missing from the registry (E1003).
    UnknownSchema = 1003,
    /// Pass options that cannot be applied (E1004).
    InvalidOptions = 1004,

    // Resource shape errors (2xxx)
    /// Attribute referenced by an argument map is absent (E2001).
    MissingAttribute = 2001,
    /// Plural expansion on a value that is not a list (E2002).
    NotIterable = 2002,
    /// Single-resource operation on a value that is not a mapping (E2003).
    NotAMapping = 2003,

    // Fetch errors (3xxx)
    /// A fetch function or interactor returned an error (E3001).
    FetchFailed = 3001,
    /// Batch result is not a list matching the input (E3002).
    InvalidBatchResult = 3002,

    // Data errors (4xxx)
    /// Scalar value could not be coerced (E4001).
    InvalidDataType = 4001,

    // Internal errors (9xxx)
    /// Internal error (E9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "E1001").
    pub fn code(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotExpandable => "Field is not expandable",
            Self::InvalidFetchDeclaration => "Invalid fetch declaration",
            Self::UnknownSchema => "Unknown schema",
            Self::InvalidOptions => "Invalid expand options",
            Self::MissingAttribute => "Missing attribute",
            Self::NotIterable => "Value is not a list",
            Self::NotAMapping => "Value is not a mapping",
            Self::FetchFailed => "Fetch failed",
            Self::InvalidBatchResult => "Invalid batch result",
            Self::InvalidDataType => "Invalid data type",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where in the resource tree an error happened.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Schema being serialized or expanded.
    pub schema: Option<String>,
    /// Attribute or field involved.
    pub field: Option<String>,
    /// Dotted field path from the root resource.
    pub path: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while expanding or serializing a resource.
#[derive(Error, Debug)]
pub struct ExpandError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        if let Some(ref path) = self.context.path {
            write!(f, " (at `{}`)", path)?;
        }
        Ok(())
    }
}

impl ExpandError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.context.schema = Some(schema.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the field unless one is already recorded.
    pub fn with_field_if_unset(mut self, field: impl Into<String>) -> Self {
        if self.context.field.is_none() {
            self.context.field = Some(field.into());
        }
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Record the field path and schema, unless a deeper location was
    /// already recorded.
    pub fn at(mut self, path: impl Into<String>, schema: impl Into<String>) -> Self {
        if self.context.path.is_none() {
            self.context.path = Some(path.into());
        }
        if self.context.schema.is_none() {
            self.context.schema = Some(schema.into());
        }
        self
    }

    // ============== Constructor Functions ==============

    /// The target schema has nothing to fetch with.
    pub fn not_expandable(schema: impl Into<String>) -> Self {
        let schema = schema.into();
        Self::new(
            ErrorCode::NotExpandable,
            format!("schema `{}` declares no `retrieve` or `batch` function", schema),
        )
        .with_schema(&schema)
        .with_suggestion(format!("Declare `.retrieve(...)` on `{}`", schema))
        .with_suggestion("Remove the field from the requested expand paths")
    }

    /// A required fetch declaration kind is missing.
    pub fn missing_declaration(schema: impl Into<String>, kind: FetchKind) -> Self {
        let schema = schema.into();
        Self::new(
            ErrorCode::NotExpandable,
            format!("schema `{}` declares no `{}` function", schema, kind),
        )
        .with_schema(&schema)
        .with_help("Single nested resources are always fetched with `retrieve`")
    }

    /// A fetch declaration is malformed.
    pub fn invalid_fetch_declaration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFetchDeclaration, message.into())
            .with_help("Each declaration is a function plus a list of `param` or `(param, attribute)` entries")
    }

    /// A named schema is not registered.
    pub fn unknown_schema(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorCode::UnknownSchema, format!("schema `{}` is not registered", name))
            .with_suggestion(format!("Register `{}` in the schema registry", name))
    }

    /// Pass options that cannot be applied.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOptions, message.into())
    }

    /// The resource lacks an attribute an argument map reads.
    pub fn missing_attribute(attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        Self::new(
            ErrorCode::MissingAttribute,
            format!("resource has no attribute `{}`", attribute),
        )
        .with_field(&attribute)
    }

    /// A plural operation received something other than a list.
    pub fn not_iterable(found: &Value) -> Self {
        Self::new(
            ErrorCode::NotIterable,
            format!("expected a list of resources, found {}", value_kind(found)),
        )
    }

    /// A single-resource operation received something other than a mapping.
    pub fn not_a_mapping(found: &Value) -> Self {
        Self::new(
            ErrorCode::NotAMapping,
            format!("expected a resource mapping, found {}", value_kind(found)),
        )
    }

    /// A fetch function or interactor failed.
    pub fn fetch_failed(schema: impl Into<String>, kind: FetchKind, source: BoxError) -> Self {
        let schema = schema.into();
        Self::new(
            ErrorCode::FetchFailed,
            format!("`{}` function of `{}` failed: {}", kind, schema, source),
        )
        .with_schema(&schema)
        .with_source(source)
    }

    /// A batch function returned something that cannot be matched to its input.
    pub fn invalid_batch_result(schema: impl Into<String>, expected: usize, found: &Value) -> Self {
        let schema = schema.into();
        let found = match found {
            Value::Array(items) => format!("a list of {}", items.len()),
            other => value_kind(other).to_string(),
        };
        Self::new(
            ErrorCode::InvalidBatchResult,
            format!(
                "`batch` function of `{}` must return a list of {} resources, returned {}",
                schema, expected, found
            ),
        )
        .with_schema(&schema)
        .with_help("Batch results are matched to the input items by position")
    }

    /// A scalar value could not be coerced to its declared kind.
    pub fn invalid_data_type(kind: &str, found: &Value) -> Self {
        Self::new(
            ErrorCode::InvalidDataType,
            format!("cannot serialize {} as {}", value_kind(found), kind),
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Check if the error comes from schema configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::NotExpandable
                | ErrorCode::InvalidFetchDeclaration
                | ErrorCode::UnknownSchema
                | ErrorCode::InvalidOptions
        )
    }

    /// Check if the error comes from the shape of the resource.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::MissingAttribute | ErrorCode::NotIterable | ErrorCode::NotAMapping
        )
    }

    /// Check if the error comes from a fetch function.
    pub fn is_fetch_error(&self) -> bool {
        matches!(self.code, ErrorCode::FetchFailed | ErrorCode::InvalidBatchResult)
    }

    // ============== Display Functions ==============

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        use std::fmt::Write;

        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);
        let location = [
            ("Path", &self.context.path),
            ("Schema", &self.context.schema),
            ("Field", &self.context.field),
        ];
        for (label, value) in location {
            if let Some(value) = value {
                let _ = writeln!(output, "  → {}: {}", label, value);
            }
        }
        if let Some(ref source) = self.source {
            let _ = writeln!(output, "  → Caused by: {}", source);
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                let _ = writeln!(output, "  {}. {}", i + 1, suggestion);
            }
        }
        if let Some(ref help) = self.context.help {
            let _ = writeln!(output, "\nHelp: {}", help);
        }

        output
    }
}

impl From<SchemaError> for ExpandError {
    fn from(err: SchemaError) -> Self {
        let base = match &err {
            SchemaError::UnknownSchema { name } => Self::unknown_schema(name.as_str()),
            SchemaError::InvalidFetch { schema, .. } => {
                Self::invalid_fetch_declaration(err.to_string()).with_schema(schema.as_str())
            }
            _ if err.is_invalid_fetch() => Self::invalid_fetch_declaration(err.to_string()),
            SchemaError::ConfigError { message } => Self::invalid_options(message.as_str()),
            _ => Self::internal(err.to_string()),
        };
        base.with_source(err)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! expand_error {
    ($code:expr, $msg:expr) => {
        $crate::error::ExpandError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::ExpandError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}
