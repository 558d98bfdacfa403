//! Runtime state of the agent process through gops

use super::{agent_pods, check_cancelled};
use crate::config::AGENT_CONTAINER_NAME;
use crate::error::{Result, SysdumpError};
use crate::sysdump::collector::Collector;
use crate::sysdump::extract::{extract_gops_pid, extract_gops_profile_data};
use crate::sysdump::filters::{pod_name, pod_namespace};
use crate::sysdump::limits::{LimitedBuffer, MB};
use crate::sysdump::paths::remove_top_directory;
use k8s_openapi::api::core::v1::Pod;
use std::path::{Component, Path, PathBuf};
use tokio_util::sync::CancellationToken;

const GOPS_BINARY: &str = "/bin/gops";

pub const GOPS_STATS: &[&str] = &["memstats", "stack", "stats"];
pub const GOPS_PROFILES: &[&str] = &["pprof-cpu", "pprof-heap"];

/// Largest profile copied out of a pod
const PROFILE_LIMIT: u64 = 256 * MB;

pub async fn collect_gops_stats(cancel: &CancellationToken, collector: &Collector) -> Result<()> {
    for pod in agent_pods(collector).await? {
        check_cancelled(cancel)?;
        let pid = match agent_pid(collector, &pod).await {
            Ok(pid) => pid,
            Err(e) => {
                collector.record_failure(&format!("Finding gops pid in {}", pod_name(&pod)), &e);
                continue;
            }
        };
        for kind in GOPS_STATS {
            check_cancelled(cancel)?;
            if let Err(e) = collect_gops_stat(collector, &pod, &pid, kind).await {
                collector.record_failure(
                    &format!("Collecting gops {kind} from {}", pod_name(&pod)),
                    &e,
                );
            }
        }
    }
    Ok(())
}

pub async fn collect_profiles(cancel: &CancellationToken, collector: &Collector) -> Result<()> {
    for pod in agent_pods(collector).await? {
        check_cancelled(cancel)?;
        let pid = match agent_pid(collector, &pod).await {
            Ok(pid) => pid,
            Err(e) => {
                collector.record_failure(&format!("Finding gops pid in {}", pod_name(&pod)), &e);
                continue;
            }
        };
        for kind in GOPS_PROFILES {
            check_cancelled(cancel)?;
            if let Err(e) = collect_profile(collector, &pod, &pid, kind).await {
                collector.record_failure(
                    &format!("Collecting gops {kind} from {}", pod_name(&pod)),
                    &e,
                );
            }
        }
    }
    Ok(())
}

/// Pid of the agent process as marked in the `gops` listing
async fn agent_pid(collector: &Collector, pod: &Pod) -> Result<String> {
    let output = gops(collector, pod, &[]).await?;
    extract_gops_pid(&output)
}

async fn collect_gops_stat(collector: &Collector, pod: &Pod, pid: &str, kind: &str) -> Result<()> {
    let output = gops(collector, pod, &[kind, pid]).await?;
    collector
        .write_file(&format!("gops-{}-{kind}-<ts>.txt", pod_name(pod)), output)
        .await?;
    Ok(())
}

/// Write a profile with gops, then copy it out of the container
async fn collect_profile(
    collector: &Collector,
    pod: &Pod,
    pid: &str,
    kind: &str,
) -> Result<PathBuf> {
    let output = gops(collector, pod, &[kind, pid]).await?;
    let remote_path = extract_gops_profile_data(&output)?;
    copy_from_pod(collector, pod, &remote_path).await
}

/// Copy `remote_path` to `<pod>/<remote_path without its top directory>`
pub async fn copy_from_pod(collector: &Collector, pod: &Pod, remote_path: &str) -> Result<PathBuf> {
    let relative = remove_top_directory(remote_path)?;
    let stays_inside = Path::new(&relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if relative.is_empty() || !stays_inside {
        return Err(SysdumpError::InvalidPath(remote_path.to_string()));
    }

    let command = vec!["cat".to_string(), remote_path.to_string()];
    let mut stdout = LimitedBuffer::new(PROFILE_LIMIT);
    let mut stderr = Vec::new();
    let exec = collector
        .client()
        .exec_in_pod_with_writers(
            pod_namespace(pod),
            pod_name(pod),
            AGENT_CONTAINER_NAME,
            &command,
            &mut stdout,
            &mut stderr,
        )
        .await;
    if stdout.exceeded() {
        return Err(SysdumpError::LimitExceeded {
            limit: PROFILE_LIMIT,
        });
    }
    exec?;

    collector
        .write_file(&format!("{}/{relative}", pod_name(pod)), stdout.into_inner()?)
        .await
}

async fn gops(collector: &Collector, pod: &Pod, args: &[&str]) -> Result<String> {
    let command: Vec<String> = std::iter::once(GOPS_BINARY)
        .chain(args.iter().copied())
        .map(String::from)
        .collect();
    let output = collector
        .client()
        .exec_in_pod(pod_namespace(pod), pod_name(pod), AGENT_CONTAINER_NAME, &command)
        .await?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
