//! Sysdump collection engine
//!
//! A [`Collector`] resolves the participating nodes, creates a timestamped
//! output directory and runs a list of independent [`Task`]s concurrently
//! against the cluster. Task failures are recorded in the run log and never
//! abort the run.

pub mod collector;
pub mod extract;
pub mod filters;
pub mod hooks;
pub mod limits;
pub mod paths;
pub mod task;
pub mod tasks;

pub use collector::{Collector, RunSummary, TaskFailure};
pub use extract::{extract_gops_pid, extract_gops_profile_data};
pub use filters::{
    filter_crashed_pods, filter_pods, filter_restarted_containers_pods,
    filter_running_not_ready_pods,
};
pub use hooks::{Hooks, NopHooks};
pub use paths::remove_top_directory;
pub use task::Task;
