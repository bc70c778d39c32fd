//! Archive export tasks.

use crate::error::{Error, ExportError, Result};
use crate::export::{ArchiveBuilder, ExportForm, ExportResult, ProgressSink, ResourceKind};
use crate::search::{MultiAlignedPeptide, SingleAlignedPeptide};
use crate::types::{Namespace, TaskId};
use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::debug;

use super::{
    MultiQuerySearchTask, SingleQuerySearchTask, StatusReporter, Task, TaskExecutor, TaskState,
};

/// Which kind of query an export was created from
pub trait ExportKind: Send + Sync + 'static {
    /// Task kind name stored in status records
    const NAME: &'static str;

    /// Payload `type` accepted for this kind (`single`, `multi` or `text`)
    const PAYLOAD_TYPE: &'static str;

    /// Human-readable label used in error messages
    const LABEL: &'static str;

    /// Archive name (without `.zip`) for the export task `id`
    fn archive_name(id: TaskId) -> String {
        id.to_string()
    }
}

/// Export kinds whose peptides come from a finished search task
pub trait SearchExportKind: ExportKind {
    /// The search task the peptides are taken from
    type Search: Task;

    /// Peptide identifiers in a successful search result
    fn peptide_ids(output: &<Self::Search as Task>::Output) -> Vec<String>;
}

/// Export of a single query search result
pub struct SingleQuery;

impl ExportKind for SingleQuery {
    const NAME: &'static str = "export_single_query";
    const PAYLOAD_TYPE: &'static str = "single";
    const LABEL: &'static str = "Single query";
}

impl SearchExportKind for SingleQuery {
    type Search = SingleQuerySearchTask;

    fn peptide_ids(output: &Vec<SingleAlignedPeptide>) -> Vec<String> {
        output.iter().map(|peptide| peptide.id.clone()).collect()
    }
}

/// Export of a multi query search result
pub struct MultiQuery;

impl ExportKind for MultiQuery {
    const NAME: &'static str = "export_multi_query";
    const PAYLOAD_TYPE: &'static str = "multi";
    const LABEL: &'static str = "Multi query";

    fn archive_name(id: TaskId) -> String {
        format!("export-{}", id)
    }
}

impl SearchExportKind for MultiQuery {
    type Search = MultiQuerySearchTask;

    fn peptide_ids(output: &Vec<MultiAlignedPeptide>) -> Vec<String> {
        output.iter().map(|peptide| peptide.id.clone()).collect()
    }
}

/// Export of a text query selection bitmap
pub struct TextQuery;

impl ExportKind for TextQuery {
    const NAME: &'static str = "export_text_query";
    const PAYLOAD_TYPE: &'static str = "text";
    const LABEL: &'static str = "Text query";
}

/// Builds a ZIP archive of the selected peptides' resources
///
/// The record's `data` is an [`ExportResult`] whose `done` list grows as each
/// resource is written, so clients can show progress while loading.
pub struct ExportTask<K: ExportKind> {
    id: TaskId,
    peptide_ids: Vec<String>,
    form: ExportForm,
    builder: ArchiveBuilder,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ExportKind> ExportTask<K> {
    /// Create an export of `peptide_ids`
    ///
    /// Rejects an empty form or an empty id list before anything is started.
    pub fn new(peptide_ids: Vec<String>, form: ExportForm, builder: ArchiveBuilder) -> Result<Self> {
        if !form.is_valid() {
            return Err(ExportError::NoResources.into());
        }
        if peptide_ids.is_empty() {
            return Err(ExportError::NoPeptides.into());
        }

        Ok(Self {
            id: TaskId::new(),
            peptide_ids,
            form,
            builder,
            _kind: PhantomData,
        })
    }

    /// Peptides this task exports
    pub fn peptide_ids(&self) -> &[String] {
        &self.peptide_ids
    }

    /// Name of the archive this task publishes
    pub fn archive_name(&self) -> String {
        K::archive_name(self.id)
    }
}

impl<K: SearchExportKind> ExportTask<K> {
    /// Create an export of the peptides found by the search task `search_id`
    ///
    /// The search must exist (`NotFound`), have finished (`Conflict`) and have
    /// succeeded (`Validation`).
    pub async fn from_search(
        executor: &TaskExecutor,
        search_id: TaskId,
        form: ExportForm,
        builder: ArchiveBuilder,
    ) -> Result<Self> {
        if !form.is_valid() {
            return Err(ExportError::NoResources.into());
        }

        let status = executor
            .get_status::<K::Search>(search_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("{} search task {} does not exist.", K::LABEL, search_id))
            })?;

        match status.state {
            TaskState::Pending { .. } => Err(Error::Conflict(format!(
                "{} search task {} has not finished yet.",
                K::LABEL,
                search_id
            ))),
            TaskState::Failed(_) => Err(Error::Validation(format!(
                "{} search task {} was not successful.",
                K::LABEL,
                search_id
            ))),
            TaskState::Succeeded(output) => Self::new(K::peptide_ids(&output), form, builder),
        }
    }
}

impl ExportTask<TextQuery> {
    /// Create an export of the peptides selected by a base64 bitmap
    pub fn from_bitmap(bitmap: &str, form: ExportForm, builder: ArchiveBuilder) -> Result<Self> {
        if !form.is_valid() {
            return Err(ExportError::NoResources.into());
        }
        let peptide_ids = crate::export::selected_peptide_ids(bitmap)?;
        Self::new(peptide_ids, form, builder)
    }
}

#[async_trait]
impl<K: ExportKind> Task for ExportTask<K> {
    const NAME: &'static str = K::NAME;
    const NAMESPACE: Namespace = Namespace::Export;

    type Context = ();
    type Output = ExportResult;

    fn id(&self) -> TaskId {
        self.id
    }

    async fn work(
        &mut self,
        reporter: &StatusReporter<Self::Context, Self::Output>,
    ) -> Result<Self::Output> {
        let name = K::archive_name(self.id);
        let mut sink = ReportingSink {
            reporter,
            result: ExportResult::new(self.peptide_ids.clone(), self.form),
        };

        let path = self
            .builder
            .build(&name, &self.peptide_ids, &self.form, &mut sink)
            .await?;
        debug!(task_id = %self.id, path = ?path, "export archive published");

        Ok(sink.result)
    }
}

struct ReportingSink<'a> {
    reporter: &'a StatusReporter<(), ExportResult>,
    result: ExportResult,
}

#[async_trait]
impl ProgressSink for ReportingSink<'_> {
    async fn resource_done(&mut self, resource: ResourceKind) -> Result<()> {
        self.result.done.push(resource);
        self.reporter.report(self.result.clone()).await?;
        Ok(())
    }
}
