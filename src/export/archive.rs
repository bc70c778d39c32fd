//! ZIP archive assembly for exports.

use crate::config::StorageConfig;
use crate::error::{Error, ExportError, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use zip::write::FileOptions;

use super::{ExportForm, ResourceHandler, ResourceKind};

/// Receives a notification each time a resource has been materialized
///
/// Export tasks implement this to push incremental status updates.
#[async_trait]
pub trait ProgressSink: Send {
    /// Called once per resource, in declared order, after it was written
    async fn resource_done(&mut self, resource: ResourceKind) -> Result<()>;
}

/// Progress sink that ignores every notification
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn resource_done(&mut self, _resource: ResourceKind) -> Result<()> {
        Ok(())
    }
}

/// Builds export archives from the asset tree
///
/// Each build works in its own scratch directory `{temp_dir}/{name}.zip.d`
/// and publishes `{archive_dir}/{name}.zip`. The scratch directory is removed
/// on every exit path, and a failed build never leaves a file at the archive
/// path.
#[derive(Clone, Debug)]
pub struct ArchiveBuilder {
    assets_dir: PathBuf,
    temp_dir: PathBuf,
    archive_dir: PathBuf,
}

impl ArchiveBuilder {
    /// Create a builder for the configured directories
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            assets_dir: storage.assets_dir.clone(),
            temp_dir: storage.temp_dir.clone(),
            archive_dir: storage.archive_dir.clone(),
        }
    }

    /// Final location of the archive called `name`
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.archive_dir.join(format!("{}.zip", name))
    }

    /// Scratch directory used while building `name`
    pub fn working_dir(&self, name: &str) -> PathBuf {
        self.temp_dir.join(format!("{}.zip.d", name))
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        self.archive_dir.join(format!("{}.zip.part", name))
    }

    /// Build the archive `name` for `peptide_ids` with the resources in `form`
    ///
    /// Fails without touching the filesystem when the form requests nothing or
    /// no peptides are given. Returns the path of the published archive.
    pub async fn build(
        &self,
        name: &str,
        peptide_ids: &[String],
        form: &ExportForm,
        progress: &mut dyn ProgressSink,
    ) -> Result<PathBuf> {
        let resources = form.exportable_resources();
        if resources.is_empty() {
            return Err(ExportError::NoResources.into());
        }
        if peptide_ids.is_empty() {
            return Err(ExportError::NoPeptides.into());
        }

        let working_dir = self.working_dir(name);
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        tokio::fs::create_dir(&working_dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                Error::Export(ExportError::WorkingDirExists {
                    path: working_dir.clone(),
                })
            } else {
                Error::Io(e)
            }
        })?;
        debug!(archive = name, working_dir = ?working_dir, "created working directory");

        let result = self
            .assemble(name, &working_dir, &resources, peptide_ids, progress)
            .await;

        if let Err(e) = tokio::fs::remove_dir_all(&working_dir).await {
            warn!(archive = name, working_dir = ?working_dir, error = %e, "failed to remove working directory");
        }

        match result {
            Ok(path) => {
                info!(
                    archive = name,
                    path = ?path,
                    resources = resources.len(),
                    peptides = peptide_ids.len(),
                    "export archive built"
                );
                Ok(path)
            }
            Err(e) => {
                self.discard(name).await;
                Err(e)
            }
        }
    }

    async fn assemble(
        &self,
        name: &str,
        working_dir: &Path,
        resources: &[ResourceKind],
        peptide_ids: &[String],
        progress: &mut dyn ProgressSink,
    ) -> Result<PathBuf> {
        for resource in resources {
            let handler = ResourceHandler::new(*resource, &self.assets_dir);
            let output_dir = working_dir.to_path_buf();
            let ids = peptide_ids.to_vec();

            spawn_blocking(move || handler.materialize(&output_dir, &ids))
                .await
                .map_err(|e| ExportError::MaterializeFailed {
                    resource: *resource,
                    reason: format!("materialize task panicked: {}", e),
                })??;

            progress.resource_done(*resource).await?;
        }

        tokio::fs::create_dir_all(&self.archive_dir).await?;

        let archive = self.archive_path(name);
        let partial = self.partial_path(name);
        let source = working_dir.to_path_buf();
        let target = partial.clone();

        spawn_blocking(move || write_zip(&source, &target))
            .await
            .map_err(|e| ExportError::ArchiveFailed {
                archive: archive.clone(),
                reason: format!("compression task panicked: {}", e),
            })??;

        tokio::fs::rename(&partial, &archive)
            .await
            .map_err(|e| ExportError::ArchiveFailed {
                archive: archive.clone(),
                reason: e.to_string(),
            })?;

        Ok(archive)
    }

    /// Remove anything a failed build may have left at the archive paths
    async fn discard(&self, name: &str) {
        for path in [self.partial_path(name), self.archive_path(name)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = ?path, "removed partial archive"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = ?path, error = %e, "failed to remove partial archive"),
            }
        }
    }
}

/// Compress the contents of `source` into a new ZIP file at `target`
fn write_zip(source: &Path, target: &Path) -> Result<()> {
    let archive_failed = |reason: String| {
        Error::Export(ExportError::ArchiveFailed {
            archive: target.to_path_buf(),
            reason,
        })
    };

    let file = File::create(target).map_err(|e| archive_failed(e.to_string()))?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    add_dir_entries(&mut zip, source, "", options)?;

    let mut writer = zip.finish()?;
    writer.flush().map_err(|e| archive_failed(e.to_string()))?;
    Ok(())
}

fn add_dir_entries<W: Write + std::io::Seek>(
    zip: &mut zip::ZipWriter<W>,
    dir: &Path,
    prefix: &str,
    options: FileOptions,
) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let entry_name = format!("{}{}", prefix, file_name);
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            zip.add_directory(entry_name.as_str(), options)?;
            add_dir_entries(zip, &path, &format!("{}/", entry_name), options)?;
        } else {
            zip.start_file(entry_name.as_str(), options)?;
            let mut input = File::open(&path)?;
            std::io::copy(&mut input, zip)?;
        }
    }

    Ok(())
}
