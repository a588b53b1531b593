//! Fetch declarations: how a schema's resources are retrieved on demand.
//!
//! A schema may declare a `retrieve` function (one resource per call) and a
//! `batch` function (one call for a whole collection). Each declaration pairs
//! the function with an ordered argument list that maps function parameters
//! onto attributes of the stub resource.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use smol_str::SmolStr;

use crate::error::{SchemaError, SchemaResult};

/// Boxed error returned by fetch functions and interactors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Keyword arguments handed to a fetch function.
pub type Arguments = IndexMap<String, Value>;

/// What a fetch function returns.
pub type FetchResult = Result<Fetched, BoxError>;

/// A deferred unit of work returned by a fetch function.
///
/// The engine executes it exactly once and uses its output in place of the
/// stub. Closures of the form `FnOnce() -> Result<Value, BoxError>` are
/// interactors already.
pub trait Interactor: Send {
    /// Run the deferred work.
    fn execute(self: Box<Self>) -> Result<Value, BoxError>;
}

impl<F> Interactor for F
where
    F: FnOnce() -> Result<Value, BoxError> + Send,
{
    fn execute(self: Box<Self>) -> Result<Value, BoxError> {
        (*self)()
    }
}

/// The outcome of calling a fetch function.
pub enum Fetched {
    /// A finished value.
    Value(Value),
    /// Work that still has to be executed.
    Deferred(Box<dyn Interactor>),
}

impl Fetched {
    /// Wrap a finished value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Wrap a deferred unit of work.
    pub fn deferred<I: Interactor + 'static>(interactor: I) -> Self {
        Self::Deferred(Box::new(interactor))
    }

    /// Check if this outcome still needs executing.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Produce the final value, executing deferred work if needed.
    pub fn resolve(self) -> Result<Value, BoxError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Deferred(interactor) => interactor.execute(),
        }
    }
}

impl From<Value> for Fetched {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A caller-supplied fetch function.
#[derive(Clone)]
pub struct FetchFunction(Arc<dyn Fn(&Arguments) -> FetchResult + Send + Sync>);

impl FetchFunction {
    /// Wrap a closure or function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Arguments) -> FetchResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the function.
    pub fn call(&self, arguments: &Arguments) -> FetchResult {
        (self.0)(arguments)
    }
}

impl fmt::Debug for FetchFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FetchFunction(..)")
    }
}

/// Which of the two fetch declarations is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// One resource per call, scalar arguments.
    Retrieve,
    /// One call for a collection, list-valued arguments.
    Batch,
}

impl FetchKind {
    /// Get the declaration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Batch => "batch",
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a declared argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgumentSpec {
    /// Parameter and attribute share a name.
    Same(SmolStr),
    /// Parameter `param` receives the resource attribute `attr`.
    Renamed { param: SmolStr, attr: SmolStr },
}

impl ArgumentSpec {
    /// Name of the fetch-function parameter.
    pub fn param(&self) -> &str {
        match self {
            Self::Same(name) => name.as_str(),
            Self::Renamed { param, .. } => param.as_str(),
        }
    }

    /// Name of the source attribute on the resource.
    pub fn attribute(&self) -> &str {
        match self {
            Self::Same(name) => name.as_str(),
            Self::Renamed { attr, .. } => attr.as_str(),
        }
    }
}

impl From<&str> for ArgumentSpec {
    fn from(name: &str) -> Self {
        Self::Same(name.into())
    }
}

impl From<String> for ArgumentSpec {
    fn from(name: String) -> Self {
        Self::Same(name.into())
    }
}

impl From<(&str, &str)> for ArgumentSpec {
    fn from((param, attr): (&str, &str)) -> Self {
        Self::Renamed {
            param: param.into(),
            attr: attr.into(),
        }
    }
}

/// A `(function, argument-list)` declaration.
#[derive(Debug, Clone)]
pub struct FetchDeclaration {
    /// The function to call.
    pub function: FetchFunction,
    /// Ordered argument list.
    pub arguments: Vec<ArgumentSpec>,
}

impl FetchDeclaration {
    /// Create a new declaration.
    pub fn new<F, I>(function: F, arguments: I) -> Self
    where
        F: Fn(&Arguments) -> FetchResult + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<ArgumentSpec>,
    {
        Self {
            function: FetchFunction::new(function),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterate `(param, attribute)` pairs in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.arguments.iter().map(|a| (a.param(), a.attribute()))
    }

    /// Source attributes read by this declaration.
    pub fn attributes(&self) -> BTreeSet<&str> {
        self.arguments.iter().map(ArgumentSpec::attribute).collect()
    }

    /// Check the declaration is well formed.
    ///
    /// Parameter and attribute names must be non-empty and parameter names
    /// must be unique.
    pub fn check(&self, schema: &str, kind: FetchKind) -> SchemaResult<()> {
        let mut seen = BTreeSet::new();
        for (param, attr) in self.pairs() {
            if param.is_empty() || attr.is_empty() {
                return Err(SchemaError::invalid_fetch(
                    schema,
                    kind.as_str(),
                    "argument names must not be empty",
                ));
            }
            if !seen.insert(param) {
                return Err(SchemaError::invalid_fetch(
                    schema,
                    kind.as_str(),
                    format!("duplicate parameter `{}`", param),
                ));
            }
        }
        Ok(())
    }
}

/// Check that `retrieve` and `batch` read the same source attributes.
///
/// Parameter names may differ between the two; the attributes they are built
/// from may not, or the two paths would not fetch the same resources.
pub fn check_consistency(
    schema: &str,
    retrieve: &FetchDeclaration,
    batch: &FetchDeclaration,
) -> SchemaResult<()> {
    let retrieve_attrs = retrieve.attributes();
    let batch_attrs = batch.attributes();
    if retrieve_attrs != batch_attrs {
        return Err(SchemaError::invalid_fetch(
            schema,
            FetchKind::Batch.as_str(),
            format!(
                "reads attributes {:?} but `retrieve` reads {:?}",
                batch_attrs, retrieve_attrs
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(args: &Arguments) -> FetchResult {
        Ok(Fetched::value(json!(args)))
    }

    #[test]
    fn test_argument_spec_conversions() {
        let same: ArgumentSpec = "id".into();
        assert_eq!(same.param(), "id");
        assert_eq!(same.attribute(), "id");

        let renamed: ArgumentSpec = ("ids", "id").into();
        assert_eq!(renamed.param(), "ids");
        assert_eq!(renamed.attribute(), "id");
    }

    #[test]
    fn test_declaration_pairs_keep_order() {
        let decl = FetchDeclaration::new(echo, [("user_id", "id"), ("org", "org_id")]);
        let pairs: Vec<_> = decl.pairs().collect();
        assert_eq!(pairs, vec![("user_id", "id"), ("org", "org_id")]);
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let decl = FetchDeclaration::new(echo, [("id", "id"), ("id", "other")]);
        let err = decl.check("User", FetchKind::Retrieve).unwrap_err();
        assert!(err.to_string().contains("retrieve"));
        assert!(err.is_invalid_fetch());
    }

    #[test]
    fn test_empty_name_rejected() {
        let decl = FetchDeclaration::new(echo, [""]);
        assert!(decl.check("User", FetchKind::Batch).is_err());
    }

    #[test]
    fn test_consistency_allows_renamed_params() {
        let retrieve = FetchDeclaration::new(echo, ["id"]);
        let batch = FetchDeclaration::new(echo, [("ids", "id")]);
        assert!(check_consistency("Item", &retrieve, &batch).is_ok());

        let other = FetchDeclaration::new(echo, [("ids", "item_id")]);
        assert!(check_consistency("Item", &retrieve, &other).is_err());
    }

    #[test]
    fn test_fetched_resolve_runs_deferred_once() {
        let fetched = Fetched::deferred(|| -> Result<Value, BoxError> { Ok(json!({"id": 1})) });
        assert!(fetched.is_deferred());
        assert_eq!(fetched.resolve().unwrap(), json!({"id": 1}));

        let ready = Fetched::from(json!(2));
        assert!(!ready.is_deferred());
        assert_eq!(ready.resolve().unwrap(), json!(2));
    }

    #[test]
    fn test_fetch_function_call() {
        let f = FetchFunction::new(echo);
        let mut args = Arguments::new();
        args.insert("id".into(), json!(4));
        let value = f.call(&args).unwrap().resolve().unwrap();
        assert_eq!(value, json!({"id": 4}));
    }
}
