//! Container log collection

use super::{agent_pods, check_cancelled};
use crate::client::LogOptions;
use crate::config::Options;
use crate::error::Result;
use crate::sysdump::collector::Collector;
use crate::sysdump::filters::{
    filter_crashed_pods, filter_restarted_containers_pods, filter_running_not_ready_pods, pod_name,
    pod_namespace,
};
use k8s_openapi::api::core::v1::Pod;
use tokio_util::sync::CancellationToken;

/// Logs of every container of every agent pod on the collected nodes
pub async fn collect_agent_logs(cancel: &CancellationToken, collector: &Collector) -> Result<()> {
    let pods = agent_pods(collector).await?;
    for pod in &pods {
        check_cancelled(cancel)?;
        collect_pod_logs(collector, pod).await;
    }
    Ok(())
}

/// Logs of a bounded sample of crashing, not-ready and restarted pods
pub async fn collect_unhealthy_pod_logs(
    cancel: &CancellationToken,
    collector: &Collector,
) -> Result<()> {
    let pods = collector.client().list_pods("", None).await?;
    let limit = collector.options().detailed_pods_limit;
    // agent pods on collected nodes already have their logs written by the agent log task
    let agents = agent_pods(collector).await?;

    let mut selected: Vec<&Pod> = Vec::new();
    for pod in filter_crashed_pods(&pods, limit)
        .into_iter()
        .chain(filter_running_not_ready_pods(&pods, limit))
        .chain(filter_restarted_containers_pods(&pods, limit))
    {
        let covered = agents.iter().any(|a| same_pod(a, pod));
        if !covered && !selected.iter().any(|p| same_pod(p, pod)) {
            selected.push(pod);
        }
    }

    collector.log(&format!("Collecting logs of {} unhealthy pods", selected.len()));
    for pod in selected {
        check_cancelled(cancel)?;
        collect_pod_logs(collector, pod).await;
    }
    Ok(())
}

/// Current logs of each container, plus previous logs for containers that restarted.
/// Failures are recorded per container.
async fn collect_pod_logs(collector: &Collector, pod: &Pod) {
    let namespace = pod_namespace(pod);
    let name = pod_name(pod);

    for (container, restarts) in containers(pod) {
        let mut runs = vec![false];
        if restarts > 0 {
            runs.push(true);
        }
        for previous in runs {
            let options = log_options(collector.options(), previous);
            let file = log_file_name(namespace, name, &container, previous);
            let result = async {
                let logs = collector
                    .client()
                    .get_logs(namespace, name, &container, &options)
                    .await?;
                collector.write_file(&file, logs).await
            }
            .await;
            if let Err(e) = result {
                let which = if previous { "previous logs" } else { "logs" };
                collector.record_failure(
                    &format!("Collecting {which} of {namespace}/{name}/{container}"),
                    &e,
                );
            }
        }
    }
}

fn log_options(options: &Options, previous: bool) -> LogOptions {
    LogOptions {
        previous,
        since_seconds: Some(options.logs_since.as_secs() as i64),
        limit_bytes: (options.logs_limit_bytes > 0).then_some(options.logs_limit_bytes),
        timestamps: true,
    }
}

/// `logs-<namespace>-<pod>-<container>[-previous]-<ts>.log`
pub fn log_file_name(namespace: &str, pod: &str, container: &str, previous: bool) -> String {
    if previous {
        format!("logs-{namespace}-{pod}-{container}-previous-<ts>.log")
    } else {
        format!("logs-{namespace}-{pod}-{container}-<ts>.log")
    }
}

/// Container names with their restart counts; init containers first
fn containers(pod: &Pod) -> Vec<(String, i32)> {
    let restarts = |name: &str| {
        pod.status
            .iter()
            .flat_map(|s| {
                s.init_container_statuses
                    .iter()
                    .flatten()
                    .chain(s.container_statuses.iter().flatten())
            })
            .find(|cs| cs.name == name)
            .map_or(0, |cs| cs.restart_count)
    };

    let Some(spec) = &pod.spec else {
        return Vec::new();
    };
    spec.init_containers
        .iter()
        .flatten()
        .chain(spec.containers.iter())
        .map(|c| (c.name.clone(), restarts(&c.name)))
        .collect()
}

fn same_pod(a: &Pod, b: &Pod) -> bool {
    pod_namespace(a) == pod_namespace(b) && pod_name(a) == pod_name(b)
}
