//! Extension point for operator-supplied collection

use super::collector::Collector;
use crate::error::Result;

/// Adds flags and tasks to a sysdump run without modifying the core.
///
/// `add_sysdump_tasks` is called exactly once while the collector is being
/// constructed; an error aborts construction.
pub trait Hooks: Send + Sync {
    fn add_sysdump_flags(&self, command: clap::Command) -> clap::Command;

    fn add_sysdump_tasks(&self, collector: &mut Collector) -> Result<()>;
}

/// Hooks that contribute nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NopHooks;

impl Hooks for NopHooks {
    fn add_sysdump_flags(&self, command: clap::Command) -> clap::Command {
        command
    }

    fn add_sysdump_tasks(&self, _collector: &mut Collector) -> Result<()> {
        Ok(())
    }
}
