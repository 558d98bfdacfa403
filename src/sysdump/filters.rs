//! Pod health filters
//!
//! Detailed per-pod collection (logs of failing pods, exec-based dumps) is
//! expensive, so it only runs on a bounded sample picked with these filters.

use k8s_openapi::api::core::v1::{ContainerStatus, Pod};

const CRASH_LOOP_BACK_OFF: &str = "CrashLoopBackOff";

/// First `limit` pods matching `predicate`, in list order. `limit <= 0` keeps every match.
pub fn filter_pods<'a, F>(pods: &'a [Pod], predicate: F, limit: i64) -> Vec<&'a Pod>
where
    F: Fn(&Pod) -> bool,
{
    let matches = pods.iter().filter(|p| predicate(p));
    if limit > 0 {
        matches.take(limit as usize).collect()
    } else {
        matches.collect()
    }
}

pub fn filter_crashed_pods(pods: &[Pod], limit: i64) -> Vec<&Pod> {
    filter_pods(pods, is_crashed, limit)
}

pub fn filter_running_not_ready_pods(pods: &[Pod], limit: i64) -> Vec<&Pod> {
    filter_pods(pods, is_running_not_ready, limit)
}

pub fn filter_restarted_containers_pods(pods: &[Pod], limit: i64) -> Vec<&Pod> {
    filter_pods(pods, has_restarted_containers, limit)
}

/// Any container or init container waiting in CrashLoopBackOff
pub fn is_crashed(pod: &Pod) -> bool {
    all_container_statuses(pod).any(|cs| {
        cs.state
            .as_ref()
            .and_then(|s| s.waiting.as_ref())
            .and_then(|w| w.reason.as_deref())
            == Some(CRASH_LOOP_BACK_OFF)
    })
}

/// Phase Running with a Ready condition explicitly False
pub fn is_running_not_ready(pod: &Pod) -> bool {
    let Some(status) = &pod.status else {
        return false;
    };
    if status.phase.as_deref() != Some("Running") {
        return false;
    }
    status
        .conditions
        .iter()
        .flatten()
        .any(|c| c.type_ == "Ready" && c.status == "False")
}

pub fn has_restarted_containers(pod: &Pod) -> bool {
    all_container_statuses(pod).any(|cs| cs.restart_count > 0)
}

fn all_container_statuses(pod: &Pod) -> impl Iterator<Item = &ContainerStatus> {
    pod.status.iter().flat_map(|s| {
        s.init_container_statuses
            .iter()
            .flatten()
            .chain(s.container_statuses.iter().flatten())
    })
}

/// Pod name for logging and file names
pub fn pod_name(pod: &Pod) -> &str {
    pod.metadata.name.as_deref().unwrap_or("unknown")
}

pub fn pod_namespace(pod: &Pod) -> &str {
    pod.metadata.namespace.as_deref().unwrap_or("default")
}

/// Node the pod is scheduled on, if any
pub fn pod_node(pod: &Pod) -> Option<&str> {
    pod.spec.as_ref().and_then(|s| s.node_name.as_deref())
}
