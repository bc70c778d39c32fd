use super::*;
use crate::config::{StorageConfig, TaskConfig};
use crate::db::Database;
use crate::error::Error;
use crate::export::{ArchiveBuilder, ResourceHandler, ResourceKind};
use crate::search::{
    Aligner, MultiAlignedPeptide, MultiAlignmentOptions, QueryRecord, SingleAlignedPeptide,
    SingleAlignmentOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;


struct Harness {
    _root: TempDir,
    db: Arc<Database>,
    storage: StorageConfig,
    executor: TaskExecutor,
}

impl Harness {
    async fn new() -> Self {
        Self::with_config(TaskConfig::default()).await
    }

    async fn with_config(config: TaskConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::new(&root.path().join("tasks.db")).await.unwrap());
        let storage = StorageConfig {
            assets_dir: root.path().join("assets"),
            temp_dir: root.path().join("temp"),
            archive_dir: root.path().join("archives"),
        };
        let executor = TaskExecutor::new(db.clone(), &config).await.unwrap();

        Self {
            _root: root,
            db,
            storage,
            executor,
        }
    }

    fn builder(&self) -> ArchiveBuilder {
        ArchiveBuilder::new(&self.storage)
    }

    fn write_source(&self, kind: ResourceKind, peptide_id: &str, content: &str) {
        let path = ResourceHandler::new(kind, &self.storage.assets_dir).source_file(peptide_id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

/// Wait until `handle` reaches `phase`, failing the test after a second
async fn wait_for_phase<C, D>(handle: &TaskHandle<C, D>, phase: TaskPhase) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while handle.phase() != phase {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("task never reached {phase:?}"));
}

/// Echoes a value after reporting each entry of `progress`
struct EchoTask {
    id: TaskId,
    value: u32,
    progress: Vec<u32>,
}

impl EchoTask {
    fn new(value: u32) -> Self {
        Self {
            id: TaskId::new(),
            value,
            progress: Vec::new(),
        }
    }
}

#[async_trait]
impl Task for EchoTask {
    const NAME: &'static str = "echo";
    const NAMESPACE: Namespace = Namespace::Search;

    type Context = String;
    type Output = u32;

    fn id(&self) -> TaskId {
        self.id
    }

    fn context(&self) -> Option<String> {
        Some(format!("echo {}", self.value))
    }

    async fn work(&mut self, reporter: &StatusReporter<String, u32>) -> Result<u32> {
        for step in &self.progress {
            reporter.report(*step).await?;
        }
        Ok(self.value)
    }
}

/// Blocks in `work` until released, then returns the value it was sent
struct GatedTask {
    id: TaskId,
    gate: Option<oneshot::Receiver<u32>>,
}

impl GatedTask {
    fn new() -> (Self, oneshot::Sender<u32>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                id: TaskId::new(),
                gate: Some(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl Task for GatedTask {
    const NAME: &'static str = "gated";
    const NAMESPACE: Namespace = Namespace::Search;

    type Context = ();
    type Output = u32;

    fn id(&self) -> TaskId {
        self.id
    }

    async fn work(&mut self, _reporter: &StatusReporter<(), u32>) -> Result<u32> {
        let gate = self
            .gate
            .take()
            .ok_or_else(|| Error::Other("gate already used".into()))?;
        gate.await
            .map_err(|_| Error::Other("gate dropped".into()))
    }
}

struct FailingTask {
    id: TaskId,
}

#[async_trait]
impl Task for FailingTask {
    const NAME: &'static str = "failing";
    const NAMESPACE: Namespace = Namespace::Export;

    type Context = ();
    type Output = u32;

    fn id(&self) -> TaskId {
        self.id
    }

    async fn work(&mut self, _reporter: &StatusReporter<(), u32>) -> Result<u32> {
        Err(Error::Other("resource unavailable".into()))
    }
}

struct PanickingTask {
    id: TaskId,
}

#[async_trait]
impl Task for PanickingTask {
    const NAME: &'static str = "panicking";
    const NAMESPACE: Namespace = Namespace::Export;

    type Context = ();
    type Output = u32;

    fn id(&self) -> TaskId {
        self.id
    }

    async fn work(&mut self, _reporter: &StatusReporter<(), u32>) -> Result<u32> {
        panic!("handler exploded");
    }
}

/// Returns fixed hits for any query
struct StubAligner {
    hits: Vec<&'static str>,
}

#[async_trait]
impl Aligner for StubAligner {
    async fn align_single(
        &self,
        query: &QueryRecord,
        _options: &SingleAlignmentOptions,
    ) -> Result<Vec<SingleAlignedPeptide>> {
        Ok(self
            .hits
            .iter()
            .map(|id| SingleAlignedPeptide {
                id: id.to_string(),
                sequence: query.sequence.clone(),
                length: query.sequence.len(),
                score: 1.0,
            })
            .collect())
    }

    async fn align_multi(
        &self,
        queries: &[QueryRecord],
        _options: &MultiAlignmentOptions,
    ) -> Result<Vec<MultiAlignedPeptide>> {
        let sequence: String = queries.iter().map(|q| q.sequence.as_str()).collect();
        Ok(self
            .hits
            .iter()
            .map(|id| MultiAlignedPeptide {
                id: id.to_string(),
                sequence: sequence.clone(),
                length: sequence.len(),
                score: 0.9,
                avg_score: 0.9,
                max_score: 1.0,
                min_score: 0.8,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
