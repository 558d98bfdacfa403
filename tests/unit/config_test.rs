//! Tests for src/config/mod.rs and option layering in src/commands/sysdump.rs

use std::path::PathBuf;
use std::time::Duration;
use sysdump::cli::SysdumpArgs;
use sysdump::commands::build_options;
use sysdump::config::{
    parse_config, AppConfig, Options, DEFAULT_DETAILED_PODS_LIMIT, DEFAULT_NAMESPACE,
    DEFAULT_WORKER_COUNT,
};
use sysdump::error::SysdumpError;

// ============================================================================
// Options::validate
// ============================================================================

#[test]
fn test_default_options_are_valid() {
    assert!(Options::default().validate().is_ok());
}

#[test]
fn test_zero_workers_rejected() {
    let options = Options {
        worker_count: 0,
        ..Default::default()
    };
    assert!(matches!(options.validate(), Err(SysdumpError::Config(_))));
}

#[test]
fn test_empty_output_name_rejected() {
    for name in ["", "   "] {
        let options = Options {
            output_file_name: name.to_string(),
            ..Default::default()
        };
        assert!(options.validate().is_err(), "name {name:?}");
    }
}

#[test]
fn test_output_name_with_separator_rejected() {
    let options = Options {
        output_file_name: format!("a{}b", std::path::MAIN_SEPARATOR),
        ..Default::default()
    };
    let err = options.validate().unwrap_err();
    assert!(err.to_string().contains("path separator"));
}

// ============================================================================
// Options::requested_nodes
// ============================================================================

#[test]
fn test_requested_nodes() {
    let cases = [
        ("", vec![]),
        (",,", vec![]),
        ("a", vec!["a"]),
        (" a , b ", vec!["a", "b"]),
        ("b,a,b", vec!["b", "a"]),
    ];
    for (list, want) in cases {
        let options = Options {
            node_list: list.to_string(),
            ..Default::default()
        };
        assert_eq!(options.requested_nodes(), want, "node list {list:?}");
    }
}

// ============================================================================
// Config file
// ============================================================================

#[test]
fn test_parse_empty_config() {
    let config = parse_config("").unwrap();
    assert!(config.namespace.is_none());
    assert!(config.worker_count.is_none());
}

#[test]
fn test_parse_config_values() {
    let config = parse_config(
        r#"
namespace = "cilium"
worker_count = 8
output_dir = "/tmp/dumps"
profiling = true
"#,
    )
    .unwrap();
    assert_eq!(config.namespace.as_deref(), Some("cilium"));
    assert_eq!(config.worker_count, Some(8));
    assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/dumps")));
    assert_eq!(config.profiling, Some(true));
}

#[test]
fn test_parse_invalid_config() {
    let result = parse_config("worker_count = \"many\"");
    assert!(matches!(result, Err(SysdumpError::Config(_))));
}

#[test]
fn test_apply_file_config_overrides_defaults() {
    let file = AppConfig {
        namespace: Some("cilium".to_string()),
        detailed_pods_limit: Some(0),
        ..Default::default()
    };
    let options = Options::default().apply_file_config(&file);
    assert_eq!(options.namespace, "cilium");
    assert_eq!(options.detailed_pods_limit, 0);
    assert_eq!(options.worker_count, DEFAULT_WORKER_COUNT);
}

// ============================================================================
// build_options: flags > file > defaults
// ============================================================================

#[test]
fn test_build_options_defaults() {
    let options = build_options(&SysdumpArgs::default(), &AppConfig::default());
    assert_eq!(options.namespace, DEFAULT_NAMESPACE);
    assert_eq!(options.worker_count, DEFAULT_WORKER_COUNT);
    assert_eq!(options.detailed_pods_limit, DEFAULT_DETAILED_PODS_LIMIT);
    assert!(options.task_timeout.is_none());
    assert!(!options.quick);
}

#[test]
fn test_build_options_flags_win_over_file() {
    let file = AppConfig {
        namespace: Some("from-file".to_string()),
        worker_count: Some(3),
        profiling: Some(true),
        ..Default::default()
    };
    let args = SysdumpArgs {
        namespace: Some("from-flag".to_string()),
        node_list: "node-a".to_string(),
        logs_since: Some(Duration::from_secs(7200)),
        task_timeout: Some(Duration::from_secs(60)),
        quick: true,
        ..Default::default()
    };
    let options = build_options(&args, &file);
    assert_eq!(options.namespace, "from-flag");
    assert_eq!(options.worker_count, 3);
    assert!(options.profiling);
    assert!(options.quick);
    assert_eq!(options.node_list, "node-a");
    assert_eq!(options.logs_since, Duration::from_secs(7200));
    assert_eq!(options.task_timeout, Some(Duration::from_secs(60)));
}
