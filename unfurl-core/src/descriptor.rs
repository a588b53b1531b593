//! Fetch descriptor resolution.
//!
//! Turns a target schema's declared `retrieve` / `batch` metadata into
//! callable descriptors with normalized argument maps.

use serde_json::Value;
use smol_str::SmolStr;
use unfurl_schema::{
    Arguments, FetchDeclaration, FetchFunction, FetchKind, Schema, check_consistency,
};

use crate::arguments::ArgumentMap;
use crate::error::{ExpandError, ExpandResult};

/// A callable fetch strategy: function plus normalized argument map.
#[derive(Debug, Clone)]
pub struct FetchDescriptor {
    /// Which declaration this came from.
    pub kind: FetchKind,
    /// The function to invoke.
    pub function: FetchFunction,
    /// Parameter name -> source attribute.
    pub arguments: ArgumentMap,
}

impl FetchDescriptor {
    /// Normalize a declaration of `schema`.
    ///
    /// A bare name `x` becomes `x -> x`; an explicit pair keeps both sides.
    pub fn from_declaration(
        schema: &str,
        kind: FetchKind,
        declaration: &FetchDeclaration,
    ) -> ExpandResult<Self> {
        declaration.check(schema, kind)?;

        let arguments = declaration
            .pairs()
            .map(|(param, attr)| (SmolStr::new(param), SmolStr::new(attr)))
            .collect();

        Ok(Self {
            kind,
            function: declaration.function.clone(),
            arguments,
        })
    }

    /// Invoke the function and run any deferred work it hands back.
    pub fn invoke(&self, schema: &str, arguments: &Arguments) -> ExpandResult<Value> {
        self.function
            .call(arguments)
            .and_then(|fetched| fetched.resolve())
            .map_err(|source| ExpandError::fetch_failed(schema, self.kind, source))
    }
}

/// The resolved descriptors of one target schema.
#[derive(Debug, Clone)]
pub struct FetchDescriptors {
    /// Per-resource descriptor.
    pub retrieve: Option<FetchDescriptor>,
    /// Collection descriptor.
    pub batch: Option<FetchDescriptor>,
}

impl FetchDescriptors {
    /// Resolve the descriptors declared by `schema`.
    ///
    /// Fails with `NotExpandable` when neither kind is declared, and with
    /// `InvalidFetchDeclaration` when a declaration is malformed or the two
    /// declarations read different attributes.
    pub fn resolve(schema: &Schema) -> ExpandResult<Self> {
        let meta = &schema.meta;
        if !meta.has_fetch() {
            return Err(ExpandError::not_expandable(schema.name()));
        }

        let resolve_kind = |kind: FetchKind| {
            meta.get(kind)
                .map(|decl| FetchDescriptor::from_declaration(schema.name(), kind, decl))
                .transpose()
        };
        let retrieve = resolve_kind(FetchKind::Retrieve)?;
        let batch = resolve_kind(FetchKind::Batch)?;

        if let (Some(r), Some(b)) = (&meta.retrieve, &meta.batch) {
            check_consistency(schema.name(), r, b)?;
        }

        Ok(Self { retrieve, batch })
    }

    /// Get a descriptor by kind.
    pub fn get(&self, kind: FetchKind) -> Option<&FetchDescriptor> {
        match kind {
            FetchKind::Retrieve => self.retrieve.as_ref(),
            FetchKind::Batch => self.batch.as_ref(),
        }
    }
}
