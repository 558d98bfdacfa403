//! Collection task abstraction

use super::collector::Collector;
use crate::error::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type Action =
    Arc<dyn Fn(CancellationToken, Arc<Collector>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// One independent unit of collection work
#[derive(Clone)]
pub struct Task {
    /// Shown in progress output and in the failure log
    pub description: String,
    /// Runs in quick mode as well
    pub quick: bool,
    action: Action,
}

impl Task {
    pub fn new<F, Fut>(description: impl Into<String>, action: F) -> Self
    where
        F: Fn(CancellationToken, Arc<Collector>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            description: description.into(),
            quick: false,
            action: Arc::new(move |cancel, collector| action(cancel, collector).boxed()),
        }
    }

    /// A task that does nothing and succeeds
    pub fn noop(description: impl Into<String>) -> Self {
        Self::new(description, |_, _| async { Ok(()) })
    }

    pub fn quick(mut self, quick: bool) -> Self {
        self.quick = quick;
        self
    }

    pub(crate) fn run(
        &self,
        cancel: CancellationToken,
        collector: Arc<Collector>,
    ) -> BoxFuture<'static, Result<()>> {
        (self.action)(cancel, collector)
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::noop("")
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("description", &self.description)
            .field("quick", &self.quick)
            .finish_non_exhaustive()
    }
}
