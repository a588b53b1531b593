//! Per-pass expansion options.

use smol_str::SmolStr;
use unfurl_schema::UnfurlConfig;
use unfurl_schema::config::ExpandConfig;

use crate::error::{ExpandError, ExpandResult};

/// Options shared by every schema instance of one serialization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Use `batch` for plural fields when the target declares one.
    pub prefer_batch: bool,
    /// Maximum number of segments kept from each requested path.
    pub max_depth: Option<usize>,
    /// Path segment separator.
    pub separator: SmolStr,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            prefer_batch: true,
            max_depth: None,
            separator: SmolStr::new_static("."),
        }
    }
}

impl ExpandOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether batch declarations are used.
    pub fn prefer_batch(mut self, prefer: bool) -> Self {
        self.prefer_batch = prefer;
        self
    }

    /// Limit the depth of requested paths.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Use a different path separator.
    pub fn separator(mut self, separator: impl Into<SmolStr>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Check that the options can drive a pass.
    ///
    /// A depth limit of zero would keep no segment and an empty separator
    /// cannot split a path.
    pub fn validate(&self) -> ExpandResult<()> {
        if self.separator.is_empty() {
            return Err(ExpandError::invalid_options("expand separator must not be empty"));
        }
        if self.max_depth == Some(0) {
            return Err(ExpandError::invalid_options("expand max_depth must be at least 1")
                .with_help("Leave max_depth unset to keep whole paths"));
        }
        Ok(())
    }
}

impl From<&ExpandConfig> for ExpandOptions {
    fn from(config: &ExpandConfig) -> Self {
        Self {
            prefer_batch: config.prefer_batch,
            max_depth: config.max_depth,
            separator: SmolStr::new(&config.separator),
        }
    }
}

impl From<&UnfurlConfig> for ExpandOptions {
    fn from(config: &UnfurlConfig) -> Self {
        Self::from(&config.expand)
    }
}
