//! Fuzz target for dumping arbitrary JSON through an expandable schema.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_dump
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::{Value, json};
use unfurl_core::Serializer;
use unfurl_schema::{Arguments, FetchResult, Fetched, Field, Schema, SchemaRef, SchemaRegistry};

fn get_node(args: &Arguments) -> FetchResult {
    Ok(Fetched::value(json!({ "id": args["id"], "next": { "id": args["id"] } })))
}

fuzz_target!(|data: &[u8]| {
    let Ok(resource) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let Ok(node) = Schema::builder("Node")
        .field(Field::int("id"))
        .field(Field::string("label"))
        .field(Field::expandable("next", SchemaRef::SelfRef))
        .field(Field::expandable("children", SchemaRef::SelfRef).many())
        .retrieve(get_node, ["id"])
        .build()
    else {
        return;
    };
    let Ok(registry) = SchemaRegistry::new().with(node) else {
        return;
    };
    let Ok(serializer) = Serializer::for_name(&registry, "Node") else {
        return;
    };

    // Errors are fine; panics are not.
    let _ = serializer.with_expand(["next.next", "children.next"]).dump(&resource);
});
