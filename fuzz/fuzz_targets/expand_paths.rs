//! Fuzz target for expand path parsing and propagation.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_expand_paths
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use unfurl_core::{ExpandOptions, ExpandSelection};

#[derive(Debug, Arbitrary)]
struct Input {
    query: String,
    separator: String,
    max_depth: Option<u8>,
}

fuzz_target!(|input: Input| {
    let mut options = ExpandOptions::default().separator(input.separator.as_str());
    if let Some(depth) = input.max_depth {
        options = options.max_depth(depth as usize);
    }
    if options.validate().is_err() {
        return;
    }

    let paths = unfurl_core::parse_paths(&input.query);
    let selection = ExpandSelection::with_options(&paths, &options);

    // Every selected field must yield a child selection without panicking,
    // and rebuilding from the reassembled paths must be stable.
    for field in selection.fields() {
        let _ = selection.child(field);
    }
    let rebuilt = ExpandSelection::with_options(selection.to_paths(), &options);
    assert_eq!(rebuilt.len(), selection.len());
});
