//! Error types for schema declaration, validation and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while declaring, registering or validating schemas.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(unfurl::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A named schema reference that the registry cannot resolve.
    #[error("unknown schema `{name}`")]
    #[diagnostic(
        code(unfurl::schema::unknown_schema),
        help("register the schema before serializing anything that nests it")
    )]
    UnknownSchema { name: String },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(unfurl::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// Invalid field definition.
    #[error("invalid field `{schema}.{field}`: {message}")]
    #[diagnostic(code(unfurl::schema::invalid_field))]
    InvalidField {
        schema: String,
        field: String,
        message: String,
    },

    /// Malformed `retrieve` or `batch` declaration.
    #[error("invalid `{kind}` declaration on `{schema}`: {message}")]
    #[diagnostic(code(unfurl::schema::invalid_fetch))]
    InvalidFetch {
        schema: String,
        kind: String,
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(unfurl::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(unfurl::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Validation error with multiple issues.
    #[error("schema validation failed with {count} error(s)")]
    #[diagnostic(code(unfurl::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create an unknown schema error.
    pub fn unknown_schema(name: impl Into<String>) -> Self {
        Self::UnknownSchema { name: name.into() }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        schema: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            schema: schema.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid fetch declaration error.
    pub fn invalid_fetch(
        schema: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidFetch {
            schema: schema.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Check whether this error (or any related error) is a fetch declaration problem.
    pub fn is_invalid_fetch(&self) -> bool {
        match self {
            Self::InvalidFetch { .. } => true,
            Self::ValidationFailed { errors, .. } => errors.iter().any(Self::is_invalid_fetch),
            _ => false,
        }
    }
}
