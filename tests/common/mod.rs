//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use peptide_tasks::config::{StorageConfig, TaskConfig};
use peptide_tasks::search::{
    MultiAlignedPeptide, MultiAlignmentOptions, QueryRecord, SingleAlignedPeptide,
    SingleAlignmentOptions,
};
use peptide_tasks::{Aligner, Database, ResourceHandler, ResourceKind, TaskExecutor};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Scratch directories, a database and an executor
pub struct TestEnv {
    pub root: TempDir,
    pub storage: StorageConfig,
    pub db_path: PathBuf,
    pub db: Arc<Database>,
    pub executor: TaskExecutor,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_tasks(TaskConfig::default()).await
    }

    pub async fn with_tasks(tasks: TaskConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            assets_dir: root.path().join("assets"),
            temp_dir: root.path().join("temp"),
            archive_dir: root.path().join("archives"),
        };
        let db_path = root.path().join("state").join("tasks.db");
        let db = Arc::new(Database::new(&db_path).await.unwrap());
        let executor = TaskExecutor::new(db.clone(), &tasks).await.unwrap();

        Self {
            root,
            storage,
            db_path,
            db,
            executor,
        }
    }

    /// Write the per-peptide source file of `kind`
    pub fn write_source(&self, kind: ResourceKind, peptide_id: &str, content: &str) {
        let path = ResourceHandler::new(kind, &self.storage.assets_dir).source_file(peptide_id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Whether the scratch directory holds nothing
    pub fn temp_is_empty(&self) -> bool {
        match std::fs::read_dir(&self.storage.temp_dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }
}

/// Returns the configured peptide ids as hits for every query
pub struct FixedAligner(pub Vec<String>);

#[async_trait]
impl Aligner for FixedAligner {
    async fn align_single(
        &self,
        query: &QueryRecord,
        _options: &SingleAlignmentOptions,
    ) -> peptide_tasks::Result<Vec<SingleAlignedPeptide>> {
        Ok(self
            .0
            .iter()
            .map(|id| SingleAlignedPeptide {
                id: id.clone(),
                sequence: query.sequence.clone(),
                length: query.sequence.len(),
                score: 1.0,
            })
            .collect())
    }

    async fn align_multi(
        &self,
        _queries: &[QueryRecord],
        _options: &MultiAlignmentOptions,
    ) -> peptide_tasks::Result<Vec<MultiAlignedPeptide>> {
        Ok(self
            .0
            .iter()
            .map(|id| MultiAlignedPeptide {
                id: id.clone(),
                sequence: String::new(),
                length: 0,
                score: 0.5,
                avg_score: 0.5,
                max_score: 0.5,
                min_score: 0.5,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
