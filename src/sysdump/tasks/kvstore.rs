//! Key-value store export from an agent pod

use crate::config::AGENT_CONTAINER_NAME;
use crate::error::{Result, SysdumpError};
use crate::sysdump::collector::Collector;
use crate::sysdump::filters::{pod_name, pod_namespace};
use crate::sysdump::limits::{LimitedBuffer, KB};
use k8s_openapi::api::core::v1::Pod;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Subtrees of the `cilium/` prefix exported from the kvstore
pub const KVSTORE_PATHS: &[&str] = &[
    "state/identities",
    "state/ip",
    "state/nodes",
    "state/cnpstatuses",
    ".heartbeat",
    "state/services",
];

const STDERR_LIMIT: u64 = 64 * KB;

/// `cilium kvstore get cilium/<path> --recursive -o json`
pub fn kvstore_command(path: &str) -> Vec<String> {
    let key = format!("cilium/{path}");
    ["cilium", "kvstore", "get", key.as_str(), "--recursive", "-o", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// `state/identities` → `kvstore-identities.json`, `.heartbeat` → `kvstore-heartbeat.json`
pub fn kvstore_file_name(path: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or(path);
    format!("kvstore-{}.json", last.trim_start_matches('.'))
}

impl Collector {
    /// Export every kvstore subtree through `pod`'s agent container.
    ///
    /// Each subtree is written to its own file; a failing subtree is recorded
    /// in the failure log and the remaining ones are still exported.
    pub async fn submit_kvstore_tasks(&self, cancel: &CancellationToken, pod: &Pod) -> Result<()> {
        let namespace = pod_namespace(pod);
        let name = pod_name(pod);

        for path in KVSTORE_PATHS {
            if cancel.is_cancelled() {
                return Err(SysdumpError::Cancelled);
            }
            let description = format!("Exporting kvstore path {path} from {namespace}/{name}");
            match self.export_kvstore_path(namespace, name, path).await {
                Ok(file) => debug!(path, file = %file.display(), "kvstore path exported"),
                Err(e) => self.record_failure(&description, &e),
            }
        }
        Ok(())
    }

    async fn export_kvstore_path(&self, namespace: &str, pod: &str, path: &str) -> Result<PathBuf> {
        let command = kvstore_command(path);
        let limit = self.options().kvstore_limit_bytes;
        let mut stdout = LimitedBuffer::new(limit);
        let mut stderr = LimitedBuffer::new(STDERR_LIMIT);

        let exec = self
            .client()
            .exec_in_pod_with_writers(
                namespace,
                pod,
                AGENT_CONTAINER_NAME,
                &command,
                &mut stdout,
                &mut stderr,
            )
            .await;
        if stdout.exceeded() {
            return Err(SysdumpError::LimitExceeded { limit });
        }
        exec?;

        let data = stdout.into_inner()?;
        self.write_file(&kvstore_file_name(path), data).await
    }
}
