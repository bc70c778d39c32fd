//! # peptide-tasks
//!
//! Background task framework for peptide search and export requests.
//!
//! ## Design Philosophy
//!
//! peptide-tasks is designed to be:
//! - **Fire and forget** - Starting a task returns its loading record at once
//! - **Pollable** - Every task persists its status under a lifetime-scoped key
//! - **Failure-capturing** - Errors inside a task become its terminal record
//! - **Library-first** - The HTTP layer is a thin trigger over the task API
//!
//! ## Quick Start
//!
//! ```no_run
//! use peptide_tasks::{
//!     ArchiveBuilder, Config, Database, ExportForm, ExportTask, ResourceKind, TaskExecutor,
//!     TextQuery,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let db = Arc::new(Database::new(&config.persistence.database_path).await?);
//!     let executor = TaskExecutor::new(db, &config.tasks).await?;
//!
//!     let form = ExportForm::with_resources(&[ResourceKind::Fasta, ResourceKind::Metadata]);
//!     let task = ExportTask::<TextQuery>::from_bitmap(
//!         "aA==",
//!         form,
//!         ArchiveBuilder::new(&config.storage),
//!     )?;
//!
//!     let mut handle = executor.start(task).await?;
//!     println!("started {}", handle.id());
//!     handle.wait().await;
//!
//!     let status = executor.get_status::<ExportTask<TextQuery>>(handle.id()).await?;
//!     println!("{}", serde_json::to_string(&status)?);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Resource export and archive building
pub mod export;
/// Result list pagination
pub mod pagination;
/// Query parsing and the alignment seam
pub mod search;
/// Background tasks with persisted status
pub mod tasks;
/// Core identifier types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, ExportError, Result, ToHttpStatus};
pub use export::{ArchiveBuilder, ExportForm, ExportResult, ResourceHandler, ResourceKind};
pub use pagination::{Pagination, WithPagination, paginate_list};
pub use search::{Aligner, NoOpAligner};
pub use tasks::{
    ExportTask, MultiQuery, MultiQuerySearchTask, SingleQuery, SingleQuerySearchTask,
    StatusStore, Task, TaskExecutor, TaskHandle, TaskPhase, TaskState, TaskStatus, TextQuery,
};
pub use types::{Namespace, TaskId};

/// Run the API server until a termination signal arrives.
///
/// Serves [`api::create_router`] on the configured bind address and shuts
/// down gracefully on a signal, letting in-flight requests finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Background tasks are not awaited; their records simply stop updating.
///
/// # Example
///
/// ```no_run
/// use peptide_tasks::{Config, Database, NoOpAligner, TaskExecutor, api::AppState, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Config::from_env()?);
///     let db = Arc::new(Database::new(&config.persistence.database_path).await?);
///     let executor = TaskExecutor::new(db, &config.tasks).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(AppState::new(executor, Arc::new(NoOpAligner), config)).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(state: api::AppState) -> Result<()> {
    api::serve(state, wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
