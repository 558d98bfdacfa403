//! Tests for src/sysdump/filters.rs - pod health filters

use crate::common::*;
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use sysdump::sysdump::{
    filter_crashed_pods, filter_pods, filter_restarted_containers_pods,
    filter_running_not_ready_pods,
};

fn names(pods: &[&Pod]) -> Vec<String> {
    pods.iter()
        .map(|p| p.metadata.name.clone().unwrap_or_default())
        .collect()
}

/// crashing, crashing init container, restarted init container, running ready,
/// failed, running not ready
fn mixed_pods() -> Vec<Pod> {
    vec![
        named_pod(
            "crashingPod",
            PodStatus {
                container_statuses: Some(vec![waiting_status("CrashLoopBackOff")]),
                ..Default::default()
            },
        ),
        named_pod(
            "crashingInitContainerPod",
            PodStatus {
                init_container_statuses: Some(vec![waiting_status("CrashLoopBackOff")]),
                ..Default::default()
            },
        ),
        named_pod(
            "restartedInitContainerPod",
            PodStatus {
                phase: Some("Pending".to_string()),
                init_container_statuses: Some(vec![terminated_status("Error", 1)]),
                ..Default::default()
            },
        ),
        named_pod(
            "runningReadyPod",
            PodStatus {
                phase: Some("Running".to_string()),
                conditions: Some(vec![ready_condition("True")]),
                ..Default::default()
            },
        ),
        named_pod(
            "nonRunningPod",
            PodStatus {
                phase: Some("Failed".to_string()),
                ..Default::default()
            },
        ),
        named_pod(
            "notReadyPod",
            PodStatus {
                phase: Some("Running".to_string()),
                conditions: Some(vec![ready_condition("False")]),
                ..Default::default()
            },
        ),
    ]
}

#[test]
fn test_filter_crashed_pods() {
    let pods = mixed_pods();
    assert_eq!(
        names(&filter_crashed_pods(&pods, 0)),
        ["crashingPod", "crashingInitContainerPod"]
    );
}

#[test]
fn test_filter_running_not_ready_pods() {
    let pods = mixed_pods();
    assert_eq!(names(&filter_running_not_ready_pods(&pods, 0)), ["notReadyPod"]);
}

#[test]
fn test_filter_restarted_containers_pods() {
    let pods = mixed_pods();
    assert_eq!(
        names(&filter_restarted_containers_pods(&pods, 0)),
        ["restartedInitContainerPod"]
    );
}

#[test]
fn test_filter_crashed_pods_limit() {
    let pods = mixed_pods();
    assert_eq!(names(&filter_crashed_pods(&pods, 1)), ["crashingPod"]);
}

#[test]
fn test_waiting_for_other_reason_is_not_crashed() {
    let pods = vec![named_pod(
        "pulling",
        PodStatus {
            container_statuses: Some(vec![waiting_status("ImagePullBackOff")]),
            ..Default::default()
        },
    )];
    assert!(filter_crashed_pods(&pods, 0).is_empty());
}

#[test]
fn test_pod_without_status_matches_nothing() {
    let pods = vec![Pod::default()];
    assert!(filter_crashed_pods(&pods, 0).is_empty());
    assert!(filter_running_not_ready_pods(&pods, 0).is_empty());
    assert!(filter_restarted_containers_pods(&pods, 0).is_empty());
}

#[test]
fn test_filter_pods_limit() {
    let pods = vec![Pod::default(); 5];
    for (limit, want) in [(0, 5), (3, 3), (100, 5), (-1, 5)] {
        assert_eq!(filter_pods(&pods, |_| true, limit).len(), want, "limit {limit}");
    }
}

#[test]
fn test_filter_pods_keeps_list_order() {
    let pods: Vec<Pod> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| named_pod(n, PodStatus::default()))
        .collect();
    let result = filter_pods(&pods, |p| p.metadata.name.as_deref() != Some("b"), 2);
    assert_eq!(names(&result), ["a", "c"]);
}
