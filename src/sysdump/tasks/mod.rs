//! Built-in collection tasks

pub mod gops;
pub mod kubernetes;
pub mod kvstore;
pub mod logs;

use super::collector::Collector;
use super::filters::pod_node;
use super::task::Task;
use crate::config::Options;
use crate::error::{Result, SysdumpError};
use k8s_openapi::api::core::v1::Pod;
use tokio_util::sync::CancellationToken;

/// The catalog registered on every collector before hooks run
pub fn builtin_tasks(options: &Options) -> Vec<Task> {
    let mut tasks = vec![
        Task::new("Collecting node list", |_, c| async move {
            kubernetes::collect_node_list(&c).await
        })
        .quick(true),
        Task::new("Collecting Kubernetes nodes", |_, c| async move {
            kubernetes::collect_nodes(&c).await
        })
        .quick(true),
        Task::new("Collecting Kubernetes namespaces", |_, c| async move {
            kubernetes::collect_namespaces(&c).await
        })
        .quick(true),
        Task::new("Collecting Kubernetes pods", |_, c| async move {
            kubernetes::collect_pods(&c).await
        })
        .quick(true),
        Task::new("Detecting cluster flavor", |cancel, c| async move {
            kubernetes::detect_flavor(&cancel, &c).await
        })
        .quick(true),
        Task::new("Collecting agent logs", |cancel, c| async move {
            logs::collect_agent_logs(&cancel, &c).await
        })
        .quick(true),
        Task::new("Collecting logs of unhealthy pods", |cancel, c| async move {
            logs::collect_unhealthy_pod_logs(&cancel, &c).await
        }),
        Task::new("Collecting gops stats", |cancel, c| async move {
            gops::collect_gops_stats(&cancel, &c).await
        }),
        Task::new("Collecting kvstore data", |cancel, c| async move {
            let pods = agent_pods(&c).await?;
            match pods.first() {
                Some(pod) => c.submit_kvstore_tasks(&cancel, pod).await,
                None => {
                    c.log(&format!(
                        "No agent pods in namespace {}, skipping kvstore export",
                        c.options().namespace
                    ));
                    Ok(())
                }
            }
        }),
    ];

    if options.profiling {
        tasks.push(Task::new("Collecting profiles", |cancel, c| async move {
            gops::collect_profiles(&cancel, &c).await
        }));
    }

    tasks
}

/// Agent pods scheduled on one of the collector's nodes
pub async fn agent_pods(collector: &Collector) -> Result<Vec<Pod>> {
    let options = collector.options();
    let pods = collector
        .client()
        .list_pods(&options.namespace, Some(&options.agent_label_selector))
        .await?;
    Ok(pods
        .into_iter()
        .filter(|p| pod_node(p).is_some_and(|n| collector.includes_node(n)))
        .collect())
}

pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(SysdumpError::Cancelled)
    } else {
        Ok(())
    }
}
