//! The sysdump collector: owns the run's directory and tasks and executes them

use super::hooks::Hooks;
use super::paths::{format_timestamp, substitute_timestamp};
use super::task::Task;
use super::tasks::builtin_tasks;
use crate::client::ClusterClient;
use crate::config::{Options, SYSDUMP_LOG_FILE};
use crate::error::{Result, SysdumpError};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A task that did not complete successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub description: String,
    pub error: String,
}

/// Outcome of [`Collector::run`]
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub total: usize,
    pub succeeded: usize,
    /// Tasks that returned an error, panicked, timed out or were interrupted
    pub failed: usize,
    /// Not started because the run was cancelled or quick mode excluded them
    pub skipped: usize,
    /// Every recorded failure, including single items (a kvstore path, a
    /// container's logs) inside tasks that still completed
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Orchestrates one sysdump run
pub struct Collector {
    client: Arc<dyn ClusterClient>,
    hooks: Arc<dyn Hooks>,
    options: Options,
    node_list: Vec<String>,
    sysdump_dir: PathBuf,
    start_time: DateTime<Utc>,
    timestamp: String,
    tasks: Vec<Task>,
    additional_tasks: Vec<Task>,
    log_file: Mutex<File>,
    failures: Mutex<Vec<TaskFailure>>,
}

impl Collector {
    /// Resolve nodes, create the sysdump directory and run log, and let hooks register tasks
    pub async fn new(
        client: Arc<dyn ClusterClient>,
        options: Options,
        hooks: Arc<dyn Hooks>,
        start_time: DateTime<Utc>,
    ) -> Result<Self> {
        options.validate()?;

        let node_list = resolve_node_list(client.as_ref(), &options).await?;
        debug!(nodes = ?node_list, "resolved node list");

        let timestamp = format_timestamp(&start_time);
        let sysdump_dir = options
            .output_dir
            .join(substitute_timestamp(&options.output_file_name, &timestamp));

        let create_dir_err = |source| SysdumpError::CreateDir {
            path: sysdump_dir.clone(),
            source,
        };
        tokio::fs::create_dir_all(&options.output_dir)
            .await
            .map_err(create_dir_err)?;
        tokio::fs::create_dir(&sysdump_dir)
            .await
            .map_err(create_dir_err)?;

        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(sysdump_dir.join(SYSDUMP_LOG_FILE))
            .map_err(create_dir_err)?;

        let tasks = builtin_tasks(&options);

        let mut collector = Self {
            client,
            hooks: Arc::clone(&hooks),
            options,
            node_list,
            sysdump_dir,
            start_time,
            timestamp,
            tasks,
            additional_tasks: Vec::new(),
            log_file: Mutex::new(log_file),
            failures: Mutex::new(Vec::new()),
        };

        collector.log(&format!(
            "Collecting sysdump in {}",
            collector.sysdump_dir.display()
        ));
        collector.log(&format!("Nodes: {}", collector.node_list.join(", ")));

        hooks
            .add_sysdump_tasks(&mut collector)
            .map_err(|e| SysdumpError::Hook(e.to_string()))?;

        Ok(collector)
    }

    /// Append tasks to run after the built-in ones. Duplicates are kept.
    pub fn add_tasks(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.additional_tasks.extend(tasks);
    }

    /// Substitute the run's timestamp into `name` and place it in the sysdump directory
    pub fn absolute_temp_path(&self, name: &str) -> PathBuf {
        self.sysdump_dir.join(substitute_timestamp(name, &self.timestamp))
    }

    pub fn client(&self) -> &dyn ClusterClient {
        self.client.as_ref()
    }

    pub fn hooks(&self) -> &dyn Hooks {
        self.hooks.as_ref()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn node_list(&self) -> &[String] {
        &self.node_list
    }

    pub fn sysdump_dir(&self) -> &Path {
        &self.sysdump_dir
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn additional_tasks(&self) -> &[Task] {
        &self.additional_tasks
    }

    /// Whether `node` is part of this run
    pub fn includes_node(&self, node: &str) -> bool {
        self.node_list.iter().any(|n| n == node)
    }

    /// Write a progress line to the log sink and the run log
    pub fn log(&self, msg: &str) {
        let line = format!("[{}] {}", Utc::now().format("%H:%M:%S"), msg);
        self.options.writer.line(&line);
        let mut file = lock(&self.log_file);
        if let Err(e) = writeln!(file, "{line}") {
            warn!("Failed to write to {}: {}", SYSDUMP_LOG_FILE, e);
        }
    }

    /// Record a failure against `description`; safe to call from concurrent tasks
    pub fn record_failure(&self, description: &str, err: &SysdumpError) {
        warn!(task = description, error = %err, "task failed");
        self.log(&format!("Task failed: {description}: {err}"));
        lock(&self.failures).push(TaskFailure {
            description: description.to_string(),
            error: err.to_string(),
        });
    }

    /// Failures recorded so far
    pub fn failures(&self) -> Vec<TaskFailure> {
        lock(&self.failures).clone()
    }

    /// Write `data` to `name` (timestamp substituted) inside the sysdump directory
    pub async fn write_file(&self, name: &str, data: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.absolute_temp_path(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Serialize `value` as YAML into `name`
    pub async fn write_yaml<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let yaml = serde_yaml::to_string(value)?;
        self.write_file(name, yaml).await
    }

    /// Run every task under the configured concurrency bound.
    ///
    /// Failing tasks are recorded and do not stop the others. Once `cancel`
    /// fires, in-flight tasks are interrupted and tasks not yet started are
    /// skipped.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<RunSummary> {
        let quick = self.options.quick;
        let all: Vec<Task> = std::mem::take(&mut self.tasks)
            .into_iter()
            .chain(std::mem::take(&mut self.additional_tasks))
            .collect();
        let total = all.len();
        let (selected, excluded): (Vec<Task>, Vec<Task>) =
            all.into_iter().partition(|t| !quick || t.quick);
        let mut skipped = excluded.len();

        let workers = self.options.worker_count;
        let task_timeout = self.options.task_timeout;
        let collector = Arc::new(self);
        collector.log(&format!(
            "Running {} tasks with {} workers",
            selected.len(),
            workers
        ));

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut running = JoinSet::new();
        let mut pending = selected.into_iter();

        while let Some(task) = pending.next() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                let remaining = 1 + pending.len();
                collector.log(&format!("Run cancelled, skipping {remaining} tasks"));
                skipped += remaining;
                break;
            };

            let collector = Arc::clone(&collector);
            let cancel = cancel.clone();
            running.spawn(async move {
                let _permit = permit;
                execute_task(task, cancel, collector, task_timeout).await
            });
        }

        let (mut succeeded, mut failed) = (0, 0);
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(true) => succeeded += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    failed += 1;
                    let err = SysdumpError::Panicked(e.to_string());
                    collector.record_failure("<unknown>", &err);
                }
            }
        }

        let summary = RunSummary {
            output_dir: collector.sysdump_dir.clone(),
            total,
            succeeded,
            failed,
            skipped,
            failures: collector.failures(),
        };
        collector.log(&format!(
            "Finished: {} succeeded, {} failed, {} skipped, {} errors recorded",
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.failures.len()
        ));
        for failure in &summary.failures {
            collector.log(&format!("  failed: {}: {}", failure.description, failure.error));
        }
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            errors = summary.failures.len(),
            skipped = summary.skipped,
            "sysdump run finished"
        );

        Ok(summary)
    }
}

/// Run one task, recording its failure. Returns whether it succeeded.
async fn execute_task(
    task: Task,
    cancel: CancellationToken,
    collector: Arc<Collector>,
    task_timeout: Option<Duration>,
) -> bool {
    if cancel.is_cancelled() {
        collector.record_failure(&task.description, &SysdumpError::Cancelled);
        return false;
    }

    collector.log(&format!("Task started: {}", task.description));
    let work = AssertUnwindSafe(task.run(cancel.clone(), Arc::clone(&collector)))
        .catch_unwind()
        .map(|res| {
            res.unwrap_or_else(|panic| Err(SysdumpError::Panicked(panic_message(&*panic))))
        });

    let bounded = async {
        match task_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .unwrap_or(Err(SysdumpError::Timeout(limit))),
            None => work.await,
        }
    };

    let result = tokio::select! {
        _ = cancel.cancelled() => Err(SysdumpError::Cancelled),
        res = bounded => res,
    };

    match result {
        Ok(()) => {
            collector.log(&format!("Task completed: {}", task.description));
            true
        }
        Err(e) => {
            collector.record_failure(&task.description, &e);
            false
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The allowlist intersected with available nodes in allowlist order, or
/// every available node when no allowlist is given
async fn resolve_node_list(client: &dyn ClusterClient, options: &Options) -> Result<Vec<String>> {
    let nodes = client.list_nodes().await?;
    let mut available: Vec<String> = Vec::with_capacity(nodes.len());
    for name in nodes.into_iter().filter_map(|n| n.metadata.name) {
        if !available.contains(&name) {
            available.push(name);
        }
    }

    let requested = options.requested_nodes();
    if requested.is_empty() {
        return Ok(available);
    }
    Ok(requested
        .into_iter()
        .filter(|name| available.contains(name))
        .collect())
}
