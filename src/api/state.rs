//! Application state for the API server

use crate::Config;
use crate::export::ArchiveBuilder;
use crate::search::Aligner;
use crate::tasks::TaskExecutor;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the task executor, the archive builder and the aligner.
#[derive(Clone)]
pub struct AppState {
    /// Starts tasks and serves their status records
    pub executor: TaskExecutor,

    /// Archive builder handed to every export task
    pub archive: ArchiveBuilder,

    /// Scoring backend handed to every search task
    pub aligner: Arc<dyn Aligner>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(executor: TaskExecutor, aligner: Arc<dyn Aligner>, config: Arc<Config>) -> Self {
        Self {
            executor,
            archive: ArchiveBuilder::new(&config.storage),
            aligner,
            config,
        }
    }
}
