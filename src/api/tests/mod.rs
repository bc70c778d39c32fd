use super::*;
use crate::Database;
use crate::error::Result;
use crate::export::{ResourceHandler, ResourceKind};
use crate::search::{
    Aligner, MultiAlignedPeptide, MultiAlignmentOptions, NoOpAligner, QueryRecord,
    SingleAlignedPeptide, SingleAlignmentOptions,
};
use crate::tasks::TaskExecutor;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot()

mod system;

/// Router plus the scratch directories backing it
struct TestApp {
    _root: TempDir,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_aligner(Arc::new(CatalogueAligner { hits: 150 })).await
    }

    async fn with_aligner(aligner: Arc<dyn Aligner>) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.assets_dir = root.path().join("assets");
        config.storage.temp_dir = root.path().join("temp");
        config.storage.archive_dir = root.path().join("archives");
        config.persistence.database_path = root.path().join("tasks.db");
        let config = Arc::new(config);

        let db = Arc::new(Database::new(&config.persistence.database_path).await.unwrap());
        let executor = TaskExecutor::new(db, &config.tasks).await.unwrap();

        Self {
            _root: root,
            state: AppState::new(executor, aligner, config),
        }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        json_body(response).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_fasta(&self, uri: &str, fasta: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", routes::CONTENT_TYPE_FASTA)
                .body(Body::from(fasta.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Poll `uri` until the record stops loading
    async fn poll(&self, uri: &str) -> Value {
        for _ in 0..200 {
            let (status, body) = self.get(uri).await;
            assert_eq!(status, StatusCode::OK, "polling {uri}: {body}");
            if body["loading"] == false {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("{uri} never finished");
    }

    fn write_source(&self, kind: ResourceKind, peptide_id: &str, content: &str) {
        let path =
            ResourceHandler::new(kind, &self.state.config.storage.assets_dir).source_file(peptide_id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

/// Returns `hits` catalogue peptides, `starPep_00000` upwards
struct CatalogueAligner {
    hits: usize,
}

#[async_trait]
impl Aligner for CatalogueAligner {
    async fn align_single(
        &self,
        query: &QueryRecord,
        _options: &SingleAlignmentOptions,
    ) -> Result<Vec<SingleAlignedPeptide>> {
        Ok((0..self.hits)
            .map(|i| SingleAlignedPeptide {
                id: crate::export::format_peptide_id(i),
                sequence: query.sequence.clone(),
                length: query.sequence.len(),
                score: 1.0 - i as f64 / 1000.0,
            })
            .collect())
    }

    async fn align_multi(
        &self,
        queries: &[QueryRecord],
        _options: &MultiAlignmentOptions,
    ) -> Result<Vec<MultiAlignedPeptide>> {
        Ok((0..self.hits)
            .map(|i| MultiAlignedPeptide {
                id: crate::export::format_peptide_id(i),
                sequence: queries[0].sequence.clone(),
                length: queries[0].sequence.len(),
                score: 0.5,
                avg_score: 0.5,
                max_score: 0.9,
                min_score: 0.1,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "catalogue"
    }
}
