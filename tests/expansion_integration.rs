//! Integration tests for relationship expansion.
//!
//! The fixture mirrors a small three-schema graph: a root schema with a
//! single and a plural expandable field, a target schema with only
//! `retrieve`, and a self-referencing target declaring both `retrieve`
//! and `batch`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use unfurl::engine::ExpandOptions;
use unfurl::prelude::*;
use unfurl::schema::FetchKind;

/// Records every fetch call made through the fixture schemas.
#[derive(Default)]
struct Backend {
    calls: Mutex<Vec<(String, FetchKind, Arguments)>>,
}

impl Backend {
    fn record(&self, schema: &str, kind: FetchKind, args: &Arguments) {
        self.calls.lock().push((schema.to_string(), kind, args.clone()));
    }

    fn count(&self, schema: &str, kind: FetchKind) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(s, k, _)| s == schema && *k == kind)
            .count()
    }

    fn total(&self) -> usize {
        self.calls.lock().len()
    }
}

fn nested_resource(id: &Value) -> Value {
    json!({
        "id": id,
        "attr3": format!("pine-{}", id),
        "attr4": format!("pineapple-{}", id),
        "attr7": {"id": 7},
    })
}

fn registry(backend: &Arc<Backend>) -> SchemaRegistry {
    let retrieve_backend = Arc::clone(backend);
    let batch_backend = Arc::clone(backend);
    let my_nested = Schema::builder("MyNestedSchema")
        .field(Field::int("id"))
        .field(Field::string("attr3"))
        .field(Field::string("attr4"))
        .field(Field::expandable("attr7", SchemaRef::SelfRef))
        .retrieve(
            move |args: &Arguments| -> FetchResult {
                retrieve_backend.record("MyNestedSchema", FetchKind::Retrieve, args);
                Ok(Fetched::value(nested_resource(&args["id"])))
            },
            ["id"],
        )
        .batch(
            move |args: &Arguments| -> FetchResult {
                batch_backend.record("MyNestedSchema", FetchKind::Batch, args);
                let ids = args["ids"].as_array().cloned().unwrap_or_default();
                Ok(Fetched::value(ids.iter().map(nested_resource).collect::<Vec<_>>()))
            },
            [("ids", "id")],
        )
        .build()
        .unwrap();

    let another_backend = Arc::clone(backend);
    let another_nested = Arc::new(
        Schema::builder("AnotherNestedSchema")
            .field(Field::int("id"))
            .field(Field::string("attr5"))
            .field(Field::expandable("attr6", "MyNestedSchema").many())
            .retrieve(
                move |args: &Arguments| -> FetchResult {
                    another_backend.record("AnotherNestedSchema", FetchKind::Retrieve, args);
                    let id = &args["my_id"];
                    Ok(Fetched::value(json!({
                        "id": id,
                        "attr5": format!("apple-{}", id),
                        "attr6": [{"id": 1}, {"id": 2}],
                    })))
                },
                [("my_id", "id")],
            )
            .build()
            .unwrap(),
    );

    let my_schema = Schema::builder("MySchema")
        .field(Field::int("id"))
        .field(Field::string("attr1"))
        .field(Field::string("attr2"))
        .field(Field::expandable("attr3", "MyNestedSchema"))
        .field(Field::expandable("attr4", another_nested).many())
        .build()
        .unwrap();

    SchemaRegistry::new()
        .with(my_nested)
        .unwrap()
        .with(my_schema)
        .unwrap()
}

fn sample() -> Value {
    json!({
        "id": 1,
        "attr1": "banana",
        "attr2": "potato",
        "attr3": {"id": 4},
        "attr4": [{"id": 1}, {"id": 2}, {"id": 3}],
    })
}

fn dump(registry: &SchemaRegistry, expand: &[&str], resource: &Value) -> Value {
    Serializer::for_name(registry, "MySchema")
        .unwrap()
        .with_expand(expand.iter().copied())
        .dump(resource)
        .unwrap()
}

fn expanded_nested(id: i64) -> Value {
    json!({"id": id, "attr3": format!("pine-{}", id), "attr4": format!("pineapple-{}", id), "attr7": {"id": 7}})
}

#[test]
fn test_serialize_single() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);

    let result = dump(&registry, &["attr3"], &sample());

    let expected = json!({
        "id": 1,
        "attr1": "banana",
        "attr2": "potato",
        "attr3": expanded_nested(4),
        "attr4": [{"id": 1}, {"id": 2}, {"id": 3}],
    });
    assert_eq!(result, expected);
    assert_eq!(backend.count("MyNestedSchema", FetchKind::Retrieve), 1);
    assert_eq!(backend.total(), 1);
}

#[test]
fn test_serialize_many() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);

    let result = dump(&registry, &["attr4"], &sample());

    let another = |id: i64| {
        json!({"id": id, "attr5": format!("apple-{}", id), "attr6": [{"id": 1}, {"id": 2}]})
    };
    let expected = json!({
        "id": 1,
        "attr1": "banana",
        "attr2": "potato",
        "attr3": {"id": 4},
        "attr4": [another(1), another(2), another(3)],
    });
    assert_eq!(result, expected);

    // No batch declared for the target: one retrieve per item, in order.
    let calls = backend.calls.lock();
    let ids: Vec<_> = calls.iter().map(|(_, _, a)| a["my_id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn test_serialize_many_nested() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);

    let result = dump(&registry, &["attr4.attr6", "attr3"], &sample());

    let another = |id: i64| {
        json!({
            "id": id,
            "attr5": format!("apple-{}", id),
            "attr6": [expanded_nested(1), expanded_nested(2)],
        })
    };
    let expected = json!({
        "id": 1,
        "attr1": "banana",
        "attr2": "potato",
        "attr3": expanded_nested(4),
        "attr4": [another(1), another(2), another(3)],
    });
    assert_eq!(result, expected);

    // attr6 is plural and its target declares `batch`: one call per list.
    assert_eq!(backend.count("MyNestedSchema", FetchKind::Batch), 3);
    assert_eq!(backend.count("MyNestedSchema", FetchKind::Retrieve), 1);
    assert_eq!(backend.count("AnotherNestedSchema", FetchKind::Retrieve), 3);
}

#[test]
fn test_three_levels_of_nesting() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);
    let resource = json!({
        "id": 1,
        "attr1": "banana",
        "attr2": "potato",
        "attr3": {"id": 4},
        "attr4": [{"id": 1}],
    });

    let result = dump(&registry, &["attr4.attr6.attr7"], &resource);

    let samey = expanded_nested(7);
    let expected = json!({
        "id": 1,
        "attr1": "banana",
        "attr2": "potato",
        "attr3": {"id": 4},
        "attr4": [{
            "id": 1,
            "attr5": "apple-1",
            "attr6": [
                {"id": 1, "attr3": "pine-1", "attr4": "pineapple-1", "attr7": samey},
                {"id": 2, "attr3": "pine-2", "attr4": "pineapple-2", "attr7": samey},
            ],
        }],
    });
    assert_eq!(result, expected);
}

#[test]
fn test_batch_called_once_with_list_arguments() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);
    let resource = json!({"id": 1, "attr4": [{"id": 5}]});

    dump(&registry, &["attr4.attr6"], &resource);

    let calls = backend.calls.lock();
    let (_, _, batch_args) = calls
        .iter()
        .find(|(_, kind, _)| *kind == FetchKind::Batch)
        .unwrap();
    assert_eq!(batch_args["ids"], json!([1, 2]));
}

#[test]
fn test_batch_disabled_falls_back_to_retrieve() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);
    let resource = json!({"id": 1, "attr4": [{"id": 5}]});

    let batched = dump(&registry, &["attr4.attr6"], &resource);
    let per_item = Serializer::for_name(&registry, "MySchema")
        .unwrap()
        .with_options(ExpandOptions::default().prefer_batch(false))
        .unwrap()
        .with_expand(["attr4.attr6"])
        .dump(&resource)
        .unwrap();

    assert_eq!(batched, per_item);
    assert_eq!(backend.count("MyNestedSchema", FetchKind::Batch), 1);
    assert_eq!(backend.count("MyNestedSchema", FetchKind::Retrieve), 2);
}

#[test]
fn test_no_expand_is_pass_through() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);

    let result = dump(&registry, &[], &sample());
    assert_eq!(result, sample());
    assert_eq!(backend.total(), 0);
}

#[test]
fn test_parent_only_path_expands_nothing_below() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);

    let result = dump(&registry, &["attr3"], &sample());
    assert_eq!(result["attr3"]["attr7"], json!({"id": 7}));

    // `attr7` alone does not name a field of MySchema.
    let result = dump(&registry, &["attr7"], &sample());
    assert_eq!(result, sample());
}

#[test]
fn test_idempotent_redump() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);

    let expanded = dump(&registry, &["attr4.attr6", "attr3"], &sample());
    let calls = backend.total();

    let redumped = dump(&registry, &[], &expanded);
    assert_eq!(redumped, expanded);
    assert_eq!(backend.total(), calls);
}

#[test]
fn test_not_expandable_leaves_input_untouched() {
    let tag = Schema::builder("Tag").field(Field::int("id")).build().unwrap();
    let post = Schema::builder("Post")
        .field(Field::int("id"))
        .field(Field::expandable("tags", "Tag").many())
        .build()
        .unwrap();
    let registry = SchemaRegistry::new().with(tag).unwrap().with(post).unwrap();
    let resource = json!({"id": 1, "tags": [{"id": 2}]});
    let before = resource.clone();

    let err = Serializer::for_name(&registry, "Post")
        .unwrap()
        .with_expand(["tags"])
        .dump(&resource)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotExpandable);
    assert!(err.is_configuration_error());
    assert_eq!(err.context.path.as_deref(), Some("tags"));
    assert_eq!(resource, before);
}

#[test]
fn test_missing_attribute_reports_path() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);
    let resource = json!({"id": 1, "attr4": [{"id": 1}, {"uuid": "x"}]});

    let err = Serializer::for_name(&registry, "MySchema")
        .unwrap()
        .with_expand(["attr4"])
        .dump(&resource)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::MissingAttribute);
    assert!(err.is_resource_error());
    assert_eq!(err.context.path.as_deref(), Some("attr4"));
    assert_eq!(err.context.schema.as_deref(), Some("AnotherNestedSchema"));
    // Arguments are built for every item before any fetch runs.
    assert_eq!(backend.total(), 0);
}

#[test]
fn test_deferred_interactor() {
    let executed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&executed);
    let customer = Schema::builder("Customer")
        .field(Field::int("id"))
        .field(Field::string("name"))
        .retrieve(
            move |args: &Arguments| -> FetchResult {
                let counter = Arc::clone(&counter);
                let id = args["id"].clone();
                Ok(Fetched::deferred(move || -> Result<Value, BoxError> {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"id": id, "name": "Ada"}))
                }))
            },
            ["id"],
        )
        .build()
        .unwrap();
    let order = Schema::builder("Order")
        .field(Field::int("id"))
        .field(Field::expandable("customer", "Customer"))
        .build()
        .unwrap();
    let registry = SchemaRegistry::new().with(customer).unwrap().with(order).unwrap();

    let out = Serializer::for_name(&registry, "Order")
        .unwrap()
        .with_expand(["customer"])
        .dump(&json!({"id": 1, "customer": {"id": 3}}))
        .unwrap();

    assert_eq!(out, json!({"id": 1, "customer": {"id": 3, "name": "Ada"}}));
    assert_eq!(executed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fetch_failure_surfaces_source() {
    let customer = Schema::builder("Customer")
        .field(Field::int("id"))
        .retrieve(|_: &Arguments| -> FetchResult { Err("timeout".into()) }, ["id"])
        .build()
        .unwrap();
    let order = Schema::builder("Order")
        .field(Field::expandable("customer", "Customer"))
        .build()
        .unwrap();
    let registry = SchemaRegistry::new().with(customer).unwrap().with(order).unwrap();

    let err = Serializer::for_name(&registry, "Order")
        .unwrap()
        .with_expand(["customer"])
        .dump(&json!({"customer": {"id": 3}}))
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::FetchFailed);
    assert!(err.is_fetch_error());
    assert_eq!(err.source.as_ref().map(|s| s.to_string()).as_deref(), Some("timeout"));
}

#[test]
fn test_dump_many_roots() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);
    let resources = json!([{"id": 1, "attr3": {"id": 4}}, {"id": 2, "attr3": {"id": 5}}]);

    let out = Serializer::for_name(&registry, "MySchema")
        .unwrap()
        .with_expand(["attr3"])
        .dump_many(&resources)
        .unwrap();

    assert_eq!(out[0]["attr3"], expanded_nested(4));
    assert_eq!(out[1]["attr3"], expanded_nested(5));
    assert_eq!(backend.count("MyNestedSchema", FetchKind::Retrieve), 2);
}

#[test]
fn test_registry_validates() {
    let backend = Arc::new(Backend::default());
    let registry = registry(&backend);
    assert!(unfurl::schema::validate_registry(&registry).is_ok());
}
