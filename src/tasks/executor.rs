//! Task lifecycle driver.

use crate::config::TaskConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{Namespace, TaskId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, watch};
use tracing::{error, info, warn};

use super::{StatusReporter, StatusStore, Task, TaskHandle, TaskPhase, TaskStatus};

/// Runs tasks in the background and serves their status records
///
/// Owned by the composition root. Cloning is cheap and clones share the
/// database and the concurrency limit.
///
/// Without `max_concurrent_tasks` every started task executes immediately;
/// there is no admission control. With a limit, tasks still write their
/// initial record at once and then wait for a free slot before working.
#[derive(Clone)]
pub struct TaskExecutor {
    db: Arc<Database>,
    search_ttl: Duration,
    export_ttl: Duration,
    limiter: Option<Arc<Semaphore>>,
}

impl TaskExecutor {
    /// Create an executor and drop status records that expired while offline
    pub async fn new(db: Arc<Database>, config: &TaskConfig) -> Result<Self> {
        let purged = db.purge_expired_statuses().await?;
        if purged > 0 {
            info!(purged, "removed expired task status records");
        }

        Ok(Self {
            db,
            search_ttl: config.search_ttl,
            export_ttl: config.export_ttl,
            limiter: config
                .max_concurrent_tasks
                .map(|limit| Arc::new(Semaphore::new(limit))),
        })
    }

    /// The shared database
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Status store for a namespace
    pub fn store(&self, namespace: Namespace) -> StatusStore {
        let ttl = match namespace {
            Namespace::Search => self.search_ttl,
            Namespace::Export => self.export_ttl,
        };
        StatusStore::new(self.db.clone(), namespace, ttl)
    }

    /// Start `task` in the background
    ///
    /// Writes the loading record, then schedules the work and returns without
    /// waiting for it. The record is readable as soon as this returns; the
    /// handle carries the same record to hand back to the client. Fails only
    /// when the loading record cannot be written, in which case nothing runs.
    pub async fn start<T: Task>(&self, task: T) -> Result<TaskHandle<T::Context, T::Output>> {
        let initial_status = task.initial_status();
        let store = self.store(T::NAMESPACE);

        // setup
        store.create(&initial_status).await?;
        info!(task_id = %initial_status.id, task = T::NAME, "task started");

        let (phase_tx, phase_rx) = watch::channel(TaskPhase::Running);
        tokio::spawn(run_lifecycle(task, store, self.limiter.clone(), phase_tx));

        Ok(TaskHandle::new(initial_status, phase_rx))
    }

    /// Current record of a task of kind `T`
    ///
    /// `None` when the record is missing, expired, unreadable or was written
    /// by a different task kind.
    pub async fn get_status<T: Task>(
        &self,
        id: TaskId,
    ) -> Result<Option<TaskStatus<T::Context, T::Output>>> {
        self.store(T::NAMESPACE).get_named(id, T::NAME).await
    }

    /// Overwrite the live record of a task of kind `T`
    ///
    /// Returns `false` when the record no longer exists.
    pub async fn update_status<T: Task>(
        &self,
        status: &TaskStatus<T::Context, T::Output>,
    ) -> Result<bool> {
        self.store(T::NAMESPACE).update(status).await
    }
}

async fn run_lifecycle<T: Task>(
    mut task: T,
    store: StatusStore,
    limiter: Option<Arc<Semaphore>>,
    phase_tx: watch::Sender<TaskPhase>,
) {
    let id = task.id();
    let context = task.context();

    let outcome: Result<()> = async {
        let _permit = match limiter {
            Some(semaphore) => Some(
                semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::TaskAborted(format!("concurrency limiter closed: {}", e)))?,
            ),
            None => None,
        };
        phase_tx.send_replace(TaskPhase::Executing);

        // work, isolated so a panic becomes a failure record
        let reporter = StatusReporter::new(store.clone(), id, T::NAME, context.clone());
        let output = tokio::spawn(async move { task.work(&reporter).await })
            .await
            .map_err(|e| Error::TaskAborted(panic_message(e)))??;

        // teardown
        let written = store
            .update(&TaskStatus::succeeded(id, T::NAME, context.clone(), output))
            .await?;
        if !written {
            warn!(task_id = %id, task = T::NAME, "task finished after its status expired");
        }
        Ok(())
    }
    .await;

    match outcome {
        Ok(()) => {
            info!(task_id = %id, task = T::NAME, "task completed");
            phase_tx.send_replace(TaskPhase::Completed);
        }
        Err(e) => {
            error!(task_id = %id, task = T::NAME, error = %e, "task failed");
            let failed: TaskStatus<T::Context, T::Output> =
                TaskStatus::failed(id, T::NAME, context, e.to_string());
            if let Err(store_err) = store.update(&failed).await {
                error!(task_id = %id, task = T::NAME, error = %store_err, "failed to persist task failure");
            }
            phase_tx.send_replace(TaskPhase::Failed);
        }
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return format!("task was cancelled: {}", err);
    }

    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", message)
    } else {
        "task panicked".to_string()
    }
}
