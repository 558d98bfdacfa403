//! Tests for src/sysdump/tasks/kvstore.rs - kvstore export

use crate::common::*;
use std::sync::Arc;
use sysdump::config::{Options, AGENT_CONTAINER_NAME};
use sysdump::sysdump::tasks::kvstore::{kvstore_command, kvstore_file_name, KVSTORE_PATHS};
use tokio_util::sync::CancellationToken;

fn expect_kvstore_get(client: &FakeClient, stdout: &[u8], paths: &[&str]) {
    for path in paths {
        let command = kvstore_command(path);
        let command: Vec<&str> = command.iter().map(String::as_str).collect();
        client.expect_stdout("ns0", "pod0", AGENT_CONTAINER_NAME, &command, stdout);
    }
}

#[tokio::test]
async fn test_kvstore_task() {
    let client = Arc::new(FakeClient::with_nodes(&["node-a"]));
    expect_kvstore_get(
        &client,
        b"{}",
        &[
            "state/identities",
            "state/ip",
            "state/nodes",
            "state/cnpstatuses",
            ".heartbeat",
            "state/services",
        ],
    );
    let (_dir, collector) = new_collector(Arc::clone(&client), Options::default()).await;

    let pod = agent_pod("pod0", "ns0", "node-a");
    collector
        .submit_kvstore_tasks(&CancellationToken::new(), &pod)
        .await
        .unwrap();

    let data = std::fs::read(collector.sysdump_dir().join("kvstore-heartbeat.json")).unwrap();
    assert_eq!(data, b"{}");
    for path in KVSTORE_PATHS {
        assert!(collector.sysdump_dir().join(kvstore_file_name(path)).is_file());
    }
    assert!(collector.failures().is_empty());
    assert_eq!(client.exec_calls.lock().unwrap().len(), KVSTORE_PATHS.len());
}

#[tokio::test]
async fn test_kvstore_writes_exact_bytes() {
    let client = Arc::new(FakeClient::with_nodes(&["node-a"]));
    let body = br#"{"cilium/state/identities/v1/id/1":"reserved:host"}"#;
    expect_kvstore_get(&client, body, KVSTORE_PATHS);
    let (_dir, collector) = new_collector(Arc::clone(&client), Options::default()).await;

    collector
        .submit_kvstore_tasks(&CancellationToken::new(), &agent_pod("pod0", "ns0", "node-a"))
        .await
        .unwrap();

    let data = std::fs::read(collector.sysdump_dir().join("kvstore-identities.json")).unwrap();
    assert_eq!(data, body);
}

#[tokio::test]
async fn test_kvstore_path_failure_is_isolated() {
    let client = Arc::new(FakeClient::with_nodes(&["node-a"]));
    // state/ip is not registered, so its exec fails
    expect_kvstore_get(
        &client,
        b"{}",
        &["state/identities", "state/nodes", "state/cnpstatuses", ".heartbeat", "state/services"],
    );
    let (_dir, collector) = new_collector(Arc::clone(&client), Options::default()).await;

    collector
        .submit_kvstore_tasks(&CancellationToken::new(), &agent_pod("pod0", "ns0", "node-a"))
        .await
        .unwrap();

    let failures = collector.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].description.contains("state/ip"));
    assert!(!collector.sysdump_dir().join("kvstore-ip.json").exists());
    assert!(collector.sysdump_dir().join("kvstore-services.json").is_file());
}

#[tokio::test]
async fn test_kvstore_stops_when_cancelled() {
    let client = Arc::new(FakeClient::with_nodes(&["node-a"]));
    let (_dir, collector) = new_collector(Arc::clone(&client), Options::default()).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = collector
        .submit_kvstore_tasks(&cancel, &agent_pod("pod0", "ns0", "node-a"))
        .await;

    assert!(result.is_err());
    assert!(client.exec_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_kvstore_limit_exceeded_is_isolated() {
    let client = Arc::new(FakeClient::with_nodes(&["node-a"]));
    expect_kvstore_get(
        &client,
        b"{}",
        &["state/identities", "state/nodes", "state/cnpstatuses", ".heartbeat", "state/services"],
    );
    expect_kvstore_get(&client, br#"{"cilium/state/ip/v1/default/10.0.0.1":"x"}"#, &["state/ip"]);
    let options = Options {
        kvstore_limit_bytes: 8,
        ..Default::default()
    };
    let (_dir, collector) = new_collector(Arc::clone(&client), options).await;

    collector
        .submit_kvstore_tasks(&CancellationToken::new(), &agent_pod("pod0", "ns0", "node-a"))
        .await
        .unwrap();

    let failures = collector.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].description.contains("state/ip"));
    assert!(failures[0].error.contains("exceeded the limit of 8 bytes"));
    assert!(!collector.sysdump_dir().join("kvstore-ip.json").exists());
    for file in ["kvstore-identities.json", "kvstore-heartbeat.json", "kvstore-services.json"] {
        assert!(collector.sysdump_dir().join(file).is_file(), "missing {file}");
    }
}
