//! Expand path selection.
//!
//! A request carries a set of dotted paths (`orders.items`, `customer`).
//! Each schema instance keeps only what concerns its own level: the first
//! segments that name one of its fields, and for each of those the residual
//! sub-paths to hand to the nested instance once that field is expanded.
//!
//! ```rust
//! use unfurl_core::ExpandSelection;
//!
//! let selection = ExpandSelection::new(["orders.items", "orders.customer", "owner"]);
//! assert!(selection.is_selected("orders"));
//! assert!(!selection.is_selected("items"));
//!
//! let below: Vec<_> = selection.descend("orders");
//! assert_eq!(below, vec!["customer".to_string(), "items".to_string()]);
//! assert!(selection.descend("owner").is_empty());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use smol_str::SmolStr;
use tracing::warn;
use unfurl_schema::Schema;

use crate::options::ExpandOptions;

/// The expand paths that apply to one schema instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandSelection {
    /// Selected field name -> residual paths below it.
    entries: BTreeMap<SmolStr, BTreeSet<String>>,
    separator: SmolStr,
}

impl Default for ExpandSelection {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            separator: ExpandOptions::default().separator,
        }
    }
}

impl ExpandSelection {
    /// Build a selection from dotted paths with default options.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_options(paths, &ExpandOptions::default())
    }

    /// Build a selection, applying the separator and depth limit.
    ///
    /// `options` must pass [`ExpandOptions::validate`]; [`Serializer`](crate::Serializer)
    /// checks them before building a selection.
    pub fn with_options<I, S>(paths: I, options: &ExpandOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let separator = options.separator.clone();
        let mut entries: BTreeMap<SmolStr, BTreeSet<String>> = BTreeMap::new();

        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }
            let path = truncate(path, &separator, options.max_depth);

            let (head, rest) = match path.split_once(separator.as_str()) {
                Some((head, rest)) => (head, Some(rest)),
                None => (path, None),
            };
            if head.is_empty() {
                continue;
            }

            let residuals = entries.entry(SmolStr::new(head)).or_default();
            if let Some(rest) = rest.filter(|r| !r.is_empty()) {
                residuals.insert(rest.to_string());
            }
        }

        Self { entries, separator }
    }

    /// Parse a comma-separated query value such as `"orders.items, customer"`.
    pub fn parse(query: &str) -> Self {
        Self::new(parse_paths(query))
    }

    /// Keep only the entries naming a declared field of `schema`.
    pub fn restrict_to(mut self, schema: &Schema) -> Self {
        self.entries.retain(|field, _| schema.has_field(field));
        self
    }

    /// Check if a field is selected at this level.
    pub fn is_selected(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    /// Selected field names at this level.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(SmolStr::as_str)
    }

    /// Residual paths below `field`; empty if the field is not selected or
    /// nothing deeper was requested.
    pub fn descend(&self, field: &str) -> Vec<String> {
        self.entries
            .get(field)
            .map(|residuals| residuals.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Selection for the instance nested under `field`.
    pub fn child(&self, field: &str) -> Self {
        let options = ExpandOptions::default().separator(self.separator.clone());
        Self::with_options(self.descend(field), &options)
    }

    /// Reassemble the full dotted paths this selection represents.
    pub fn to_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for (field, residuals) in &self.entries {
            if residuals.is_empty() {
                paths.push(field.to_string());
            }
            for residual in residuals {
                paths.push(format!("{}{}{}", field, self.separator, residual));
            }
        }
        paths
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of selected fields at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Split a comma-separated expand query into individual paths.
pub fn parse_paths(query: &str) -> Vec<String> {
    query
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn truncate<'p>(path: &'p str, separator: &str, max_depth: Option<usize>) -> &'p str {
    let Some(max_depth) = max_depth else {
        return path;
    };
    match path.match_indices(separator).nth(max_depth.saturating_sub(1)) {
        Some((cut, _)) => {
            warn!(path = %path, max_depth, "expand path truncated");
            &path[..cut]
        }
        None => path,
    }
}
