//! Table-driven tests for configuration loading and validation.

mod common;

use common::{ConfigBuilder, TestHarness};

use order_splitter::config::{load_config, load_config_from_str, OverwritePolicy};
use order_splitter::error::ConfigError;

struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "store_label": "Lowes",
            "output_root": "/srv/orders",
            "log_dir": "/srv/orders/logs",
            "overwrite": "fail-on-conflict",
            "audit_lock_timeout_ms": 2500
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "missing_version",
        config_json: r#"{ "store_label": "Depot" }"#,
        should_succeed: false,
        expected_error: Some("version"),
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{ "version": "9.9" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "empty_label",
        config_json: r#"{ "version": "1.0", "store_label": "   " }"#,
        should_succeed: false,
        expected_error: Some("store_label"),
    },
    ConfigTestCase {
        name: "label_with_traversal",
        config_json: r#"{ "version": "1.0", "store_label": "..\\up" }"#,
        should_succeed: false,
        expected_error: Some("store_label"),
    },
    ConfigTestCase {
        name: "unknown_overwrite_policy",
        config_json: r#"{ "version": "1.0", "overwrite": "sometimes" }"#,
        should_succeed: false,
        expected_error: Some("unknown variant"),
    },
    ConfigTestCase {
        name: "empty_log_dir",
        config_json: r#"{ "version": "1.0", "log_dir": "" }"#,
        should_succeed: false,
        expected_error: Some("log_dir"),
    },
    ConfigTestCase {
        name: "not_json",
        config_json: "version = 1.0",
        should_succeed: false,
        expected_error: Some("parse"),
    },
];

#[test]
fn test_json_config_cases() {
    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("case '{}' failed: {}", case.name, e),
            (false, Ok(_)) => panic!("case '{}' should have failed", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    assert!(
                        e.to_string().contains(expected),
                        "case '{}': '{}' does not mention '{}'",
                        case.name,
                        e,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_config_file_round_trip() {
    let harness = TestHarness::new();
    let config = ConfigBuilder::new()
        .store_label("Lowes")
        .overwrite(OverwritePolicy::FailOnConflict)
        .build();
    let path = harness.write_config("splitter.json", &config);

    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded.store_label, "Lowes");
    assert_eq!(loaded.overwrite, OverwritePolicy::FailOnConflict);
}

#[test]
fn test_missing_config_file() {
    let harness = TestHarness::new();
    let path = harness.config_dir.join("absent.json");

    match load_config(&path) {
        Err(ConfigError::ReadFile { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected ReadFile error, got {:?}", other),
    }
}
