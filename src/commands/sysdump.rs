//! Sysdump command implementation

use crate::cli::{Cli, OutputFormat, SysdumpArgs};
use crate::client::{create_client, KubeClusterClient};
use crate::config::{load_config, AppConfig, LogSink, Options};
use crate::error::Result;
use crate::output::format_summary;
use crate::sysdump::{Collector, Hooks, RunSummary};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Build run options: CLI flags over the config file over defaults
pub fn build_options(args: &SysdumpArgs, file: &AppConfig) -> Options {
    let mut options = Options {
        writer: LogSink::stderr(),
        ..Default::default()
    }
    .apply_file_config(file);

    if let Some(ns) = &args.namespace {
        options.namespace = ns.clone();
    }
    if let Some(name) = &args.output_filename {
        options.output_file_name = name.clone();
    }
    if let Some(dir) = &args.output_dir {
        options.output_dir = dir.clone();
    }
    options.node_list = args.node_list.clone();
    if let Some(workers) = args.worker_count {
        options.worker_count = workers;
    }
    options.quick = args.quick;
    if let Some(limit) = args.logs_limit_bytes {
        options.logs_limit_bytes = limit;
    }
    if let Some(since) = args.logs_since {
        options.logs_since = since;
    }
    if let Some(limit) = args.detailed_pods_limit {
        options.detailed_pods_limit = limit;
    }
    options.profiling |= args.profiling;
    options.task_timeout = args.task_timeout;
    if let Some(limit) = args.kvstore_limit_bytes {
        options.kvstore_limit_bytes = limit;
    }
    options
}

/// Collect a sysdump and print its summary
pub async fn run_sysdump(cli: &Cli, hooks: Arc<dyn Hooks>) -> Result<RunSummary> {
    let file_config = load_config()?;
    let options = build_options(&cli.sysdump, &file_config);

    let client = create_client(cli.context.as_deref()).await?;
    let client = Arc::new(KubeClusterClient::new(client));
    let collector = Collector::new(client, options, hooks, Utc::now()).await?;
    info!(dir = %collector.sysdump_dir().display(), "collector ready");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining tasks");
            on_signal.cancel();
        }
    });

    let summary = collector.run(cancel).await?;

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&summary)?),
        OutputFormat::Table => print!("{}", format_summary(&summary)),
    }

    Ok(summary)
}
