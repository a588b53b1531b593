//! Integration tests for configuration parsing and handling.
//!
//! These tests verify that `unfurl.toml` settings reach the serializer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use unfurl::engine::ExpandOptions;
use unfurl::prelude::*;
use unfurl::schema::config::LogFormat;

/// Test minimal configuration
#[test]
fn test_config_minimal() {
    let config = UnfurlConfig::from_str("").expect("Failed to parse config");
    assert!(config.expand.prefer_batch);
    assert_eq!(config.expand.separator, ".");
}

/// Test full configuration with all options
#[test]
fn test_config_full() {
    let config_str = r#"
        [expand]
        prefer_batch = false
        max_depth = 8
        separator = "/"

        [logging]
        level = "debug"
        format = "pretty"

        [environments.test.expand]
        prefer_batch = true

        [environments.test.logging]
        level = "trace"
    "#;

    let config = UnfurlConfig::from_str(config_str).expect("Failed to parse config");
    assert!(!config.expand.prefer_batch);
    assert_eq!(config.expand.max_depth, Some(8));
    assert_eq!(config.expand.separator, "/");
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(config.environments.contains_key("test"));
}

/// Test that toml deserializes the same structure directly
#[test]
fn test_config_plain_toml() {
    let config: UnfurlConfig = toml::from_str("[expand]\nmax_depth = 2\n").expect("Failed to parse config");
    assert_eq!(config.expand.max_depth, Some(2));
}

/// Test environment overrides
#[test]
fn test_config_environment_override() {
    let config_str = r#"
        [expand]
        prefer_batch = true

        [environments.ci.expand]
        prefer_batch = false
        max_depth = 2

        [environments.ci.logging]
        format = "compact"
    "#;

    let config = UnfurlConfig::from_str(config_str)
        .expect("Failed to parse config")
        .with_environment("ci")
        .expect("Failed to apply environment");
    assert!(!config.expand.prefer_batch);
    assert_eq!(config.expand.max_depth, Some(2));
    assert_eq!(config.logging.format, LogFormat::Compact);

    let options = ExpandOptions::from(&config);
    assert!(!options.prefer_batch);
    assert_eq!(options.max_depth, Some(2));
}

/// Test environment variable interpolation
#[test]
fn test_config_env_vars() {
    // SAFETY: the variable name is unique to this test
    unsafe {
        std::env::set_var("UNFURL_TEST_LOG_LEVEL", "info");
    }
    let config = UnfurlConfig::from_str("[logging]\nlevel = \"${UNFURL_TEST_LOG_LEVEL}\"\n")
        .expect("Failed to parse config");
    assert_eq!(config.logging.level, "info");
}

/// Test invalid configurations are rejected
#[test]
fn test_config_invalid() {
    assert!(UnfurlConfig::from_str("[expand]\nseparator = \"\"\n").is_err());
    assert!(UnfurlConfig::from_str("[expand]\nmax_depth = 0\n").is_err());
    assert!(UnfurlConfig::from_str("[database]\nurl = \"x\"\n").is_err());
    assert!(UnfurlConfig::from_str("[environments.ci.expand]\nmax_depth = 0\n").is_err());
}

/// Test invalid programmatic options are rejected by the serializer
#[test]
fn test_invalid_options_rejected() {
    let registry = SchemaRegistry::new()
        .with(Schema::builder("Tag").field(Field::int("id")).build().unwrap())
        .unwrap();

    let err = Serializer::for_name(&registry, "Tag")
        .unwrap()
        .with_options(ExpandOptions::default().max_depth(0))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOptions);

    let mut config = UnfurlConfig::default();
    config.expand.separator = String::new();
    let err = Serializer::for_name(&registry, "Tag")
        .unwrap()
        .with_config(&config)
        .unwrap_err();
    assert!(err.is_configuration_error());
}

fn counting_registry(retrieves: &Arc<AtomicUsize>, batches: &Arc<AtomicUsize>) -> SchemaRegistry {
    let retrieves = Arc::clone(retrieves);
    let batches = Arc::clone(batches);
    let item = Schema::builder("Item")
        .field(Field::int("id"))
        .field(Field::expandable("parent", SchemaRef::SelfRef))
        .retrieve(
            move |args: &Arguments| -> FetchResult {
                retrieves.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched::value(json!({"id": args["id"], "parent": {"id": 0}})))
            },
            ["id"],
        )
        .batch(
            move |args: &Arguments| -> FetchResult {
                batches.fetch_add(1, Ordering::SeqCst);
                let items: Vec<Value> = args["ids"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|id| json!({"id": id, "parent": {"id": 0}}))
                    .collect();
                Ok(Fetched::value(items))
            },
            [("ids", "id")],
        )
        .build()
        .unwrap();
    let order = Schema::builder("Order")
        .field(Field::expandable("items", "Item").many())
        .build()
        .unwrap();
    SchemaRegistry::new().with(item).unwrap().with(order).unwrap()
}

/// Test prefer_batch from configuration controls the fetch strategy
#[test]
fn test_config_prefer_batch_reaches_serializer() {
    let retrieves = Arc::new(AtomicUsize::new(0));
    let batches = Arc::new(AtomicUsize::new(0));
    let registry = counting_registry(&retrieves, &batches);
    let order = json!({"items": [{"id": 1}, {"id": 2}]});

    let config = UnfurlConfig::from_str("[expand]\nprefer_batch = false\n").unwrap();
    Serializer::for_name(&registry, "Order")
        .unwrap()
        .with_config(&config)
        .unwrap()
        .with_expand(["items"])
        .dump(&order)
        .unwrap();

    assert_eq!(retrieves.load(Ordering::SeqCst), 2);
    assert_eq!(batches.load(Ordering::SeqCst), 0);
}

/// Test max_depth from configuration truncates deep paths
#[test]
fn test_config_max_depth_truncates() {
    let retrieves = Arc::new(AtomicUsize::new(0));
    let batches = Arc::new(AtomicUsize::new(0));
    let registry = counting_registry(&retrieves, &batches);
    let order = json!({"items": [{"id": 1}]});

    let config = UnfurlConfig::from_str("[expand]\nmax_depth = 2\n").unwrap();
    let out = Serializer::for_name(&registry, "Order")
        .unwrap()
        .with_config(&config)
        .unwrap()
        .with_expand(["items.parent.parent"])
        .dump(&order)
        .unwrap();

    // `items` and `items.parent` are expanded; the third segment is dropped.
    assert_eq!(out["items"][0]["parent"], json!({"id": 0, "parent": {"id": 0}}));
    assert_eq!(batches.load(Ordering::SeqCst), 1);
    assert_eq!(retrieves.load(Ordering::SeqCst), 1);
}

/// Test custom separator from configuration
#[test]
fn test_config_separator() {
    let retrieves = Arc::new(AtomicUsize::new(0));
    let batches = Arc::new(AtomicUsize::new(0));
    let registry = counting_registry(&retrieves, &batches);

    let config = UnfurlConfig::from_str("[expand]\nseparator = \"/\"\n").unwrap();
    let out = Serializer::for_name(&registry, "Order")
        .unwrap()
        .with_config(&config)
        .unwrap()
        .with_expand(["items/parent"])
        .dump(&json!({"items": [{"id": 1}]}))
        .unwrap();

    assert_eq!(out["items"][0]["parent"]["parent"], json!({"id": 0}));
    assert_eq!(retrieves.load(Ordering::SeqCst), 1);
}
