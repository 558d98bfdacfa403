//! CLI definitions using clap

use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "sysdump",
    version,
    about = "Collect a diagnostic bundle from a Kubernetes cluster",
    long_about = None,
)]
pub struct Cli {
    /// Kubernetes context to use
    #[arg(long, env = "SYSDUMP_CONTEXT")]
    pub context: Option<String>,

    /// Summary output format
    #[arg(short = 'o', long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    #[command(flatten)]
    pub sysdump: SysdumpArgs,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Flags shaping a sysdump run. Unset values fall back to the config file, then defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct SysdumpArgs {
    /// Namespace the agent runs in
    #[arg(short = 'n', long, env = "SYSDUMP_NAMESPACE")]
    pub namespace: Option<String>,

    /// Name of the sysdump directory; <ts> is replaced by the start time
    #[arg(long)]
    pub output_filename: Option<String>,

    /// Directory the sysdump directory is created in
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated list of nodes to collect from
    #[arg(long, default_value = "")]
    pub node_list: String,

    /// Number of tasks run concurrently
    #[arg(long)]
    pub worker_count: Option<usize>,

    /// Only collect the essentials
    #[arg(long)]
    pub quick: bool,

    /// Byte limit per container log (0 = unlimited)
    #[arg(long)]
    pub logs_limit_bytes: Option<i64>,

    /// Only collect logs newer than this, e.g. "2h"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub logs_since: Option<Duration>,

    /// Pods per health filter receiving detailed collection (0 = all)
    #[arg(long)]
    pub detailed_pods_limit: Option<i64>,

    /// Collect CPU and heap profiles of the agent
    #[arg(long)]
    pub profiling: bool,

    /// Abort any single task running longer than this, e.g. "5m"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub task_timeout: Option<Duration>,

    /// Byte limit on each exported kvstore subtree
    #[arg(long)]
    pub kvstore_limit_bytes: Option<u64>,
}
