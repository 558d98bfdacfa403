//! Cluster metadata tasks

use super::check_cancelled;
use crate::error::Result;
use crate::sysdump::collector::Collector;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::List;
use std::fmt::Write;
use tokio_util::sync::CancellationToken;

/// Namespaces whose presence identifies a managed distribution
const FLAVOR_NAMESPACES: &[(&str, &str)] = &[
    ("openshift-config", "OpenShift"),
    ("cattle-system", "Rancher"),
    ("gke-managed-system", "GKE"),
    ("amazon-cloudwatch", "EKS"),
    ("kube-system", "Kubernetes"),
];

pub async fn collect_node_list(collector: &Collector) -> Result<()> {
    let mut content = collector.node_list().join("\n");
    content.push('\n');
    collector.write_file("nodes-<ts>.txt", content).await?;
    Ok(())
}

pub async fn collect_nodes(collector: &Collector) -> Result<()> {
    let nodes: Vec<Node> = collector
        .client()
        .list_nodes()
        .await?
        .into_iter()
        .filter(|n| {
            n.metadata
                .name
                .as_deref()
                .is_some_and(|name| collector.includes_node(name))
        })
        .collect();
    collector
        .write_yaml("k8s-nodes-<ts>.yaml", &as_list(nodes))
        .await?;
    Ok(())
}

pub async fn collect_namespaces(collector: &Collector) -> Result<()> {
    let namespaces = collector.client().list_namespaces().await?;
    collector
        .write_yaml("k8s-namespaces-<ts>.yaml", &as_list(namespaces))
        .await?;
    Ok(())
}

pub async fn collect_pods(collector: &Collector) -> Result<()> {
    let pods = collector.client().list_pods("", None).await?;
    collector
        .write_yaml("k8s-pods-<ts>.yaml", &as_list(pods))
        .await?;
    Ok(())
}

/// Record which well-known namespaces exist, and the flavor they point to
pub async fn detect_flavor(cancel: &CancellationToken, collector: &Collector) -> Result<()> {
    let mut report = String::new();
    let mut flavor = None;
    for (namespace, name) in FLAVOR_NAMESPACES {
        check_cancelled(cancel)?;
        let present = collector.client().get_namespace(namespace).await?.is_some();
        if present && flavor.is_none() {
            flavor = Some(*name);
        }
        let _ = writeln!(
            report,
            "{namespace}: {}",
            if present { "present" } else { "absent" }
        );
    }
    let _ = writeln!(report, "flavor: {}", flavor.unwrap_or("unknown"));
    collector.write_file("cluster-flavor-<ts>.txt", report).await?;
    Ok(())
}

fn as_list<T: k8s_openapi::ListableResource>(items: Vec<T>) -> List<T> {
    List {
        items,
        metadata: Default::default(),
    }
}
