//! Run configuration for sysdump

use crate::error::{Result, SysdumpError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Placeholder substituted with the run's start time in output names
pub const TIMESTAMP_PLACEHOLDER: &str = "<ts>";

/// chrono format used for the timestamp placeholder
pub const TIME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Name of the run log written inside the sysdump directory
pub const SYSDUMP_LOG_FILE: &str = "cilium-sysdump.log";

pub const DEFAULT_OUTPUT_FILE_NAME: &str = "cilium-sysdump-<ts>";
pub const DEFAULT_NAMESPACE: &str = "kube-system";
pub const DEFAULT_AGENT_LABEL_SELECTOR: &str = "k8s-app=cilium";
pub const AGENT_CONTAINER_NAME: &str = "cilium-agent";
pub const DEFAULT_WORKER_COUNT: usize = 5;
pub const DEFAULT_LOGS_LIMIT_BYTES: i64 = 1024 * 1024 * 1024;
pub const DEFAULT_LOGS_SINCE: Duration = Duration::from_secs(365 * 24 * 60 * 60);
pub const DEFAULT_DETAILED_PODS_LIMIT: i64 = 5;
pub const DEFAULT_KVSTORE_LIMIT_BYTES: u64 = 64 * 1024 * 1024;

/// Shared sink receiving human-readable progress lines
#[derive(Clone)]
pub struct LogSink(Arc<Mutex<Box<dyn Write + Send>>>);

impl LogSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    /// A sink that drops everything
    pub fn discard() -> Self {
        Self::new(std::io::sink())
    }

    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }

    /// Write one line; progress output is best effort
    pub fn line(&self, msg: &str) {
        if let Ok(mut w) = self.0.lock() {
            let _ = writeln!(w, "{msg}");
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::discard()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

/// Immutable input to a sysdump run
#[derive(Debug, Clone)]
pub struct Options {
    /// Output directory name, may embed `<ts>`
    pub output_file_name: String,
    /// Parent directory the sysdump directory is created in
    pub output_dir: PathBuf,
    /// Comma-separated node allowlist; empty means every node
    pub node_list: String,
    /// Destination for progress output
    pub writer: LogSink,
    /// Upper bound on concurrently running tasks
    pub worker_count: usize,
    /// Namespace the agent runs in
    pub namespace: String,
    pub agent_label_selector: String,
    /// Only run tasks marked quick
    pub quick: bool,
    pub logs_limit_bytes: i64,
    pub logs_since: Duration,
    /// Cap on pods receiving detailed collection per health filter (<= 0 = unbounded)
    pub detailed_pods_limit: i64,
    pub profiling: bool,
    pub task_timeout: Option<Duration>,
    /// Ceiling on the JSON read back for one kvstore subtree
    pub kvstore_limit_bytes: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            output_dir: PathBuf::from("."),
            node_list: String::new(),
            writer: LogSink::default(),
            worker_count: DEFAULT_WORKER_COUNT,
            namespace: DEFAULT_NAMESPACE.to_string(),
            agent_label_selector: DEFAULT_AGENT_LABEL_SELECTOR.to_string(),
            quick: false,
            logs_limit_bytes: DEFAULT_LOGS_LIMIT_BYTES,
            logs_since: DEFAULT_LOGS_SINCE,
            detailed_pods_limit: DEFAULT_DETAILED_PODS_LIMIT,
            profiling: false,
            task_timeout: None,
            kvstore_limit_bytes: DEFAULT_KVSTORE_LIMIT_BYTES,
        }
    }
}

impl Options {
    /// Reject configurations that cannot produce a run
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(SysdumpError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.output_file_name.trim().is_empty() {
            return Err(SysdumpError::Config(
                "output file name must not be empty".to_string(),
            ));
        }
        if self.output_file_name.contains(std::path::MAIN_SEPARATOR) {
            return Err(SysdumpError::Config(format!(
                "output file name {:?} must not contain a path separator",
                self.output_file_name
            )));
        }
        Ok(())
    }

    /// Requested node names in caller order, trimmed and deduplicated
    pub fn requested_nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = Vec::new();
        for name in self.node_list.split(',').map(str::trim) {
            if !name.is_empty() && !nodes.iter().any(|n| n == name) {
                nodes.push(name.to_string());
            }
        }
        nodes
    }

    /// Overlay values from the config file onto these options
    pub fn apply_file_config(mut self, file: &AppConfig) -> Self {
        if let Some(name) = &file.output_file_name {
            self.output_file_name = name.clone();
        }
        if let Some(dir) = &file.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(ns) = &file.namespace {
            self.namespace = ns.clone();
        }
        if let Some(workers) = file.worker_count {
            self.worker_count = workers;
        }
        if let Some(limit) = file.logs_limit_bytes {
            self.logs_limit_bytes = limit;
        }
        if let Some(limit) = file.detailed_pods_limit {
            self.detailed_pods_limit = limit;
        }
        if let Some(profiling) = file.profiling {
            self.profiling = profiling;
        }
        self
    }
}

/// Defaults stored in ~/.sysdump/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub output_file_name: Option<String>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub worker_count: Option<usize>,
    #[serde(default)]
    pub logs_limit_bytes: Option<i64>,
    #[serde(default)]
    pub detailed_pods_limit: Option<i64>,
    #[serde(default)]
    pub profiling: Option<bool>,
}

/// Get the sysdump config directory (~/.sysdump)
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".sysdump"))
        .ok_or_else(|| SysdumpError::Config("Could not determine home directory".to_string()))
}

/// Load application config from ~/.sysdump/config.toml
pub fn load_config() -> Result<AppConfig> {
    let path = config_dir()?.join("config.toml");
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        parse_config(&content)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    toml::from_str(content).map_err(|e| SysdumpError::Config(e.to_string()))
}
