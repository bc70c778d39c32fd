//! Background task execution with persisted, pollable status
//!
//! A [`Task`] is a unit of background work with an id, a kind name and a
//! namespace. [`TaskExecutor::start`] runs its lifecycle:
//!
//! 1. **setup** writes the initial loading record with a fresh lifetime,
//!    before `start` returns its [`TaskHandle`]
//! 2. **work** computes the result on the tokio runtime, optionally reporting
//!    progress through a [`StatusReporter`]
//! 3. **teardown** writes the terminal success record
//!
//! Any error from work or teardown, including a panic inside `work`, is
//! persisted as a terminal failure record carrying the error message. Nothing
//! is returned to the caller of `start`; clients observe the outcome by
//! polling [`TaskExecutor::get_status`].
//!
//! ## Submodules
//!
//! - [`executor`] — lifecycle driver and type-scoped status lookups
//! - [`status`] — the [`TaskStatus`] record and its wire shape
//! - [`store`] — namespaced [`StatusStore`]
//! - [`search`] — single and multi query alignment tasks
//! - [`export`] — archive export tasks

use crate::error::Result;
use crate::types::{Namespace, TaskId};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

mod executor;
mod export;
mod search;
mod status;
mod store;

pub use executor::TaskExecutor;
pub use export::{ExportKind, ExportTask, MultiQuery, SearchExportKind, SingleQuery, TextQuery};
pub use search::{MultiQuerySearchTask, SingleQuerySearchTask};
pub use status::{TaskState, TaskStatus};
pub use store::StatusStore;

/// A unit of background work with a persisted status
#[async_trait]
pub trait Task: Send + 'static {
    /// Kind discriminator stored in every status record
    const NAME: &'static str;

    /// Namespace the status records live in
    const NAMESPACE: Namespace;

    /// Immutable creation context echoed in every record
    type Context: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Result type, also used for partial progress
    type Output: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// This task's identifier
    fn id(&self) -> TaskId;

    /// Context to attach to every record
    fn context(&self) -> Option<Self::Context> {
        None
    }

    /// Perform the computation
    async fn work(
        &mut self,
        reporter: &StatusReporter<Self::Context, Self::Output>,
    ) -> Result<Self::Output>;

    /// The loading record a trigger can hand out before any work runs
    fn initial_status(&self) -> TaskStatus<Self::Context, Self::Output> {
        TaskStatus::pending(self.id(), Self::NAME, self.context())
    }
}

/// Lifecycle phase of a started task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskPhase {
    /// Initial record written; waiting to be scheduled or for a slot
    Running,
    /// Computing
    Executing,
    /// Terminal success record written
    Completed,
    /// Terminal failure record written
    Failed,
}

impl TaskPhase {
    /// Whether the task has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Completed | TaskPhase::Failed)
    }
}

/// Caller-side view of a started task
pub struct TaskHandle<C, D> {
    id: TaskId,
    initial_status: TaskStatus<C, D>,
    phase: watch::Receiver<TaskPhase>,
}

impl<C, D> TaskHandle<C, D> {
    pub(crate) fn new(
        initial_status: TaskStatus<C, D>,
        phase: watch::Receiver<TaskPhase>,
    ) -> Self {
        Self {
            id: initial_status.id,
            initial_status,
            phase,
        }
    }

    /// The task's identifier
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The loading record returned to the trigger
    pub fn initial_status(&self) -> &TaskStatus<C, D> {
        &self.initial_status
    }

    /// Consume the handle, keeping only the initial record
    pub fn into_initial_status(self) -> TaskStatus<C, D> {
        self.initial_status
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> TaskPhase {
        *self.phase.borrow()
    }

    /// Wait until the task reaches a terminal phase
    pub async fn wait(&mut self) -> TaskPhase {
        if let Ok(phase) = self.phase.wait_for(TaskPhase::is_terminal).await {
            return *phase;
        }
        *self.phase.borrow()
    }
}

/// Lets a running task publish partial results
pub struct StatusReporter<C, D> {
    store: StatusStore,
    id: TaskId,
    name: &'static str,
    context: Option<C>,
    _data: std::marker::PhantomData<fn(D)>,
}

impl<C: Serialize + Clone, D: Serialize> StatusReporter<C, D> {
    pub(crate) fn new(store: StatusStore, id: TaskId, name: &'static str, context: Option<C>) -> Self {
        Self {
            store,
            id,
            name,
            context,
            _data: std::marker::PhantomData,
        }
    }

    /// Replace the task's record with a loading record carrying `progress`
    ///
    /// Returns `false` if the record has already expired.
    pub async fn report(&self, progress: D) -> Result<bool> {
        let status = TaskStatus::in_progress(self.id, self.name, self.context.clone(), progress);
        self.store.update(&status).await
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
