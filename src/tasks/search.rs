//! Single and multi query alignment tasks.

use crate::error::{Error, Result};
use crate::search::{
    Aligner, MultiAlignedPeptide, MultiAlignmentOptions, QueryRecord, SingleAlignedPeptide,
    SingleAlignmentOptions, is_multi_fasta_valid, is_single_fasta_valid, parse_fasta,
};
use crate::types::{Namespace, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{StatusReporter, Task};

/// Aligns one FASTA query against the peptide catalogue
pub struct SingleQuerySearchTask {
    id: TaskId,
    query: QueryRecord,
    options: SingleAlignmentOptions,
    aligner: Arc<dyn Aligner>,
}

impl SingleQuerySearchTask {
    /// Create a task from FASTA text holding exactly one non-empty record
    pub fn new(
        fasta: &str,
        options: SingleAlignmentOptions,
        aligner: Arc<dyn Aligner>,
    ) -> Result<Self> {
        let mut records = parse_fasta(fasta);
        if !is_single_fasta_valid(&records) {
            return Err(Error::Validation(
                "Request body is not valid FASTA.".to_string(),
            ));
        }

        Ok(Self {
            id: TaskId::new(),
            query: records.remove(0),
            options,
            aligner,
        })
    }

    /// The parsed query
    pub fn query(&self) -> &QueryRecord {
        &self.query
    }
}

#[async_trait]
impl Task for SingleQuerySearchTask {
    const NAME: &'static str = "single_query";
    const NAMESPACE: Namespace = Namespace::Search;

    type Context = SingleAlignmentOptions;
    type Output = Vec<SingleAlignedPeptide>;

    fn id(&self) -> TaskId {
        self.id
    }

    fn context(&self) -> Option<Self::Context> {
        Some(self.options.clone())
    }

    async fn work(
        &mut self,
        _reporter: &StatusReporter<Self::Context, Self::Output>,
    ) -> Result<Self::Output> {
        let query = QueryRecord {
            sequence: self.query.normalized_sequence(),
            ..self.query.clone()
        };
        debug!(
            task_id = %self.id,
            aligner = self.aligner.name(),
            length = query.sequence.len(),
            "aligning single query"
        );

        self.aligner.align_single(&query, &self.options).await
    }
}

/// Aligns several FASTA queries against the peptide catalogue
pub struct MultiQuerySearchTask {
    id: TaskId,
    queries: Vec<QueryRecord>,
    options: MultiAlignmentOptions,
    aligner: Arc<dyn Aligner>,
}

impl MultiQuerySearchTask {
    /// Create a task from FASTA text holding at least one record, none empty
    pub fn new(
        fasta: &str,
        options: MultiAlignmentOptions,
        aligner: Arc<dyn Aligner>,
    ) -> Result<Self> {
        let queries = parse_fasta(fasta);
        if !is_multi_fasta_valid(&queries) {
            return Err(Error::Validation(
                "Request body is not valid FASTA.".to_string(),
            ));
        }

        Ok(Self {
            id: TaskId::new(),
            queries,
            options,
            aligner,
        })
    }

    /// The parsed queries
    pub fn queries(&self) -> &[QueryRecord] {
        &self.queries
    }
}

#[async_trait]
impl Task for MultiQuerySearchTask {
    const NAME: &'static str = "multi_query";
    const NAMESPACE: Namespace = Namespace::Search;

    type Context = MultiAlignmentOptions;
    type Output = Vec<MultiAlignedPeptide>;

    fn id(&self) -> TaskId {
        self.id
    }

    fn context(&self) -> Option<Self::Context> {
        Some(self.options.clone())
    }

    async fn work(
        &mut self,
        _reporter: &StatusReporter<Self::Context, Self::Output>,
    ) -> Result<Self::Output> {
        let queries: Vec<QueryRecord> = self
            .queries
            .iter()
            .map(|query| QueryRecord {
                sequence: query.normalized_sequence(),
                ..query.clone()
            })
            .collect();
        debug!(
            task_id = %self.id,
            aligner = self.aligner.name(),
            queries = queries.len(),
            "aligning multi query"
        );

        self.aligner.align_multi(&queries, &self.options).await
    }
}
