//! Kubernetes client abstraction
//!
//! Collection tasks only see the narrow [`ClusterClient`] surface so they can
//! run against a stub in tests; [`KubeClusterClient`] backs it with kube-rs.

use crate::error::{Result, SysdumpError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use kube::api::{AttachParams, ListParams, LogParams};
use kube::{config::KubeConfigOptions, Api, Client, Config};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Create a Kubernetes client for the specified context
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = load_config(context).await?;
    Client::try_from(config).map_err(SysdumpError::from)
}

/// Load Kubernetes configuration
async fn load_config(context: Option<&str>) -> Result<Config> {
    let options = KubeConfigOptions {
        context: context.map(String::from),
        ..Default::default()
    };

    Config::from_kubeconfig(&options)
        .await
        .map_err(|e| SysdumpError::Config(format!("Failed to load kubeconfig: {e}")))
}

/// Captured output of a command run inside a container
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Options for fetching container logs
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub previous: bool,
    pub since_seconds: Option<i64>,
    pub limit_bytes: Option<i64>,
    pub timestamps: bool,
}

/// Cluster operations consumed by collection tasks
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// List pods in `namespace`, or in every namespace when it is empty
    async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<Pod>>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>>;

    /// `Ok(None)` when the namespace does not exist
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>>;

    /// Stream a command's stdout and stderr into the given sinks
    async fn exec_in_pod_with_writers(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()>;

    async fn get_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        options: &LogOptions,
    ) -> Result<String>;

    /// Run a command and buffer both output streams
    async fn exec_in_pod(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput> {
        let mut out = ExecOutput::default();
        self.exec_in_pod_with_writers(
            namespace,
            pod,
            container,
            command,
            &mut out.stdout,
            &mut out.stderr,
        )
        .await?;
        Ok(out)
    }
}

/// [`ClusterClient`] backed by a live kube-rs client
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<Pod>> {
        let mut lp = ListParams::default();
        if let Some(selector) = label_selector {
            lp = lp.labels(selector);
        }
        Ok(self.pods(namespace).list(&lp).await?.items)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn exec_in_pod_with_writers(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let ap = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(true)
            .stderr(true);

        let mut attached = api.exec(pod, command.to_vec(), &ap).await?;
        let status = attached.take_status();

        let out_reader = attached.stdout();
        let err_reader = attached.stderr();
        let (out_res, err_res) = tokio::join!(
            copy_stream(out_reader, stdout),
            copy_stream(err_reader, stderr),
        );
        out_res?;
        err_res?;

        let exec_error = |message: String| SysdumpError::Exec {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            command: command.join(" "),
            message,
        };

        if let Some(status) = status {
            if let Some(status) = status.await {
                if status.status.as_deref() == Some("Failure") {
                    return Err(exec_error(
                        status.message.unwrap_or_else(|| "command failed".to_string()),
                    ));
                }
            }
        }

        attached
            .join()
            .await
            .map_err(|e| exec_error(e.to_string()))
    }

    async fn get_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        options: &LogOptions,
    ) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams {
            container: Some(container.to_string()),
            previous: options.previous,
            since_seconds: options.since_seconds,
            limit_bytes: options.limit_bytes,
            timestamps: options.timestamps,
            ..Default::default()
        };
        Ok(api.logs(pod, &lp).await?)
    }
}

/// Copy an attached stream into a sink until EOF
async fn copy_stream(
    reader: Option<impl AsyncRead + Unpin>,
    writer: &mut (dyn AsyncWrite + Send + Unpin),
) -> Result<()> {
    let Some(mut reader) = reader else {
        return Ok(());
    };
    let mut buf = vec![0u8; 4096];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
    }
    writer.flush().await?;
    Ok(())
}
