//! Fuzz target for the `unfurl.toml` parser.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use unfurl_schema::UnfurlConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // The parser should never panic, only return errors
        if let Ok(config) = UnfurlConfig::from_str(input) {
            if let Ok(merged) = config.with_environment("test") {
                assert_ne!(merged.expand.max_depth, Some(0));
            }
        }
    }
});
