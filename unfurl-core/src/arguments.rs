//! Argument building: mapping resource attributes onto fetch parameters.
//!
//! An [`ArgumentMap`] pairs each fetch-function parameter with the resource
//! attribute it reads. Building runs in one of three modes:
//!
//! - [`BuildMode::One`]: one mapping in, one argument set out
//! - [`BuildMode::Each`]: a list in, one argument set per item
//! - [`BuildMode::Aggregate`]: a list in, one argument set whose values are
//!   the per-item values collected into lists
//!
//! ```rust
//! use serde_json::json;
//! use unfurl_core::arguments::{ArgumentMap, build_aggregate, build_one};
//!
//! let mut map = ArgumentMap::new();
//! map.insert("ids".into(), "id".into());
//!
//! let one = build_one(&json!({"id": 4, "name": "x"}), &map).unwrap();
//! assert_eq!(one["ids"], json!(4));
//!
//! let all = build_aggregate(&json!([{"id": 1}, {"id": 2}]), &map).unwrap();
//! assert_eq!(all["ids"], json!([1, 2]));
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Value};
use smol_str::SmolStr;
use tracing::trace;
use unfurl_schema::Arguments;

use crate::error::{ExpandError, ExpandResult};

/// Ordered mapping from fetch parameter name to source attribute name.
pub type ArgumentMap = IndexMap<SmolStr, SmolStr>;

/// How arguments are built from the source resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// A single mapping.
    #[default]
    One,
    /// A list, one argument set per item.
    Each,
    /// A list, a single argument set with list values.
    Aggregate,
}

impl BuildMode {
    /// Pick the mode from the plural and aggregate switches.
    pub fn from_flags(many: bool, aggregate: bool) -> Self {
        match (many, aggregate) {
            (false, _) => Self::One,
            (true, false) => Self::Each,
            (true, true) => Self::Aggregate,
        }
    }
}

/// Output of [`build`].
#[derive(Debug, Clone, PartialEq)]
pub enum Built {
    /// One argument set.
    One(Arguments),
    /// One argument set per item, in item order.
    Each(Vec<Arguments>),
}

impl Built {
    /// Get the single argument set, if this is one.
    pub fn into_one(self) -> Option<Arguments> {
        match self {
            Self::One(arguments) => Some(arguments),
            Self::Each(_) => None,
        }
    }

    /// Get the per-item argument sets, if this is a list.
    pub fn into_each(self) -> Option<Vec<Arguments>> {
        match self {
            Self::Each(arguments) => Some(arguments),
            Self::One(_) => None,
        }
    }
}

/// Build arguments in the given mode.
pub fn build(resource: &Value, map: &ArgumentMap, mode: BuildMode) -> ExpandResult<Built> {
    match mode {
        BuildMode::One => build_one(resource, map).map(Built::One),
        BuildMode::Each => build_each(resource, map).map(Built::Each),
        BuildMode::Aggregate => build_aggregate(resource, map).map(Built::One),
    }
}

/// Build one argument set from a single resource mapping.
pub fn build_one(resource: &Value, map: &ArgumentMap) -> ExpandResult<Arguments> {
    let object = resource
        .as_object()
        .ok_or_else(|| ExpandError::not_a_mapping(resource))?;
    let arguments = from_object(object, map)?;
    trace!(params = ?arguments.keys().collect::<Vec<_>>(), "built fetch arguments");
    Ok(arguments)
}

/// Build one argument set per item of a resource list.
pub fn build_each(resource: &Value, map: &ArgumentMap) -> ExpandResult<Vec<Arguments>> {
    let items = as_list(resource)?;
    let arguments = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item
                .as_object()
                .ok_or_else(|| ExpandError::not_a_mapping(item).with_help(item_help(index)))?;
            from_object(object, map).map_err(|e| e.with_help(item_help(index)))
        })
        .collect::<ExpandResult<Vec<_>>>()?;
    crate::unfurl_trace!(items = arguments.len(), "built per-item fetch arguments");
    Ok(arguments)
}

/// Build a single argument set collecting each attribute across all items.
pub fn build_aggregate(resource: &Value, map: &ArgumentMap) -> ExpandResult<Arguments> {
    let each = build_each(resource, map)?;

    let mut columns: IndexMap<String, Vec<Value>> = map
        .keys()
        .map(|param| (param.to_string(), Vec::with_capacity(each.len())))
        .collect();
    for arguments in each {
        for (param, value) in arguments {
            if let Some(column) = columns.get_mut(&param) {
                column.push(value);
            }
        }
    }

    let arguments: Arguments = columns
        .into_iter()
        .map(|(param, values)| (param, Value::Array(values)))
        .collect();
    trace!(params = ?arguments.keys().collect::<Vec<_>>(), "built aggregated fetch arguments");
    Ok(arguments)
}

fn from_object(object: &Map<String, Value>, map: &ArgumentMap) -> ExpandResult<Arguments> {
    map.iter()
        .map(|(param, attr)| {
            object
                .get(attr.as_str())
                .map(|value| (param.to_string(), value.clone()))
                .ok_or_else(|| ExpandError::missing_attribute(attr.as_str()))
        })
        .collect()
}

fn as_list(resource: &Value) -> ExpandResult<&Vec<Value>> {
    resource
        .as_array()
        .ok_or_else(|| ExpandError::not_iterable(resource))
}

fn item_help(index: usize) -> String {
    format!("raised while reading item {} of the list", index)
}
