//! Per-resource materialization into a build's working directory.
//!
//! Handlers do blocking filesystem I/O and are driven from
//! `spawn_blocking` by the archive builder.

use crate::error::{ExportError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ResourceKind;

/// Materializes one [`ResourceKind`] from the asset tree
///
/// Stateless apart from the asset root it resolves sources against.
#[derive(Clone, Debug)]
pub struct ResourceHandler {
    kind: ResourceKind,
    assets_dir: PathBuf,
}

/// How per-peptide sources are combined into the output artifact
enum Layout {
    /// Concatenate rows, keeping the header line of the first file only
    Csv,
    /// Concatenate records verbatim
    Fasta,
    /// Copy each file into a subdirectory
    Directory,
}

impl ResourceHandler {
    /// Resolve the handler for `kind` against the asset root
    pub fn new(kind: ResourceKind, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            assets_dir: assets_dir.into(),
        }
    }

    /// The resource this handler produces
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Directory holding the per-peptide source files
    pub fn source_location(&self) -> PathBuf {
        let peptides = self.assets_dir.join("peptides");
        match self.kind {
            ResourceKind::Attributes => peptides.join("csv").join("attributes"),
            ResourceKind::Metadata => peptides.join("csv").join("metadata"),
            ResourceKind::Fasta => peptides.join("fasta"),
            ResourceKind::EsmMean => peptides.join("csv").join("embeddings").join("esm-mean"),
            ResourceKind::IFeatureAac => peptides
                .join("csv")
                .join("embeddings")
                .join("ifeature-aac-20"),
            ResourceKind::IFeatureDpc => peptides
                .join("csv")
                .join("embeddings")
                .join("ifeature-dpc-400"),
            ResourceKind::Pdb => peptides.join("pdb"),
        }
    }

    /// Name of the artifact inside the working directory
    pub fn output_name(&self) -> &'static str {
        match self.kind {
            ResourceKind::Attributes => "attributes.csv",
            ResourceKind::Metadata => "metadata.csv",
            ResourceKind::Fasta => "peptides.fasta",
            ResourceKind::EsmMean => "esm-mean.csv",
            ResourceKind::IFeatureAac => "ifeature-aac-20.csv",
            ResourceKind::IFeatureDpc => "ifeature-dpc-400.csv",
            ResourceKind::Pdb => "pdb",
        }
    }

    fn layout(&self) -> Layout {
        match self.kind {
            ResourceKind::Fasta => Layout::Fasta,
            ResourceKind::Pdb => Layout::Directory,
            ResourceKind::Attributes
            | ResourceKind::Metadata
            | ResourceKind::EsmMean
            | ResourceKind::IFeatureAac
            | ResourceKind::IFeatureDpc => Layout::Csv,
        }
    }

    fn extension(&self) -> &'static str {
        match self.layout() {
            Layout::Csv => "csv",
            Layout::Fasta => "fasta",
            Layout::Directory => "pdb",
        }
    }

    /// Path of the source file for one peptide
    pub fn source_file(&self, peptide_id: &str) -> PathBuf {
        self.source_location()
            .join(format!("{}.{}", peptide_id, self.extension()))
    }

    /// Write this resource's artifact for `peptide_ids` into `output_dir`
    ///
    /// A missing or unreadable source file fails the whole resource.
    pub fn materialize(&self, output_dir: &Path, peptide_ids: &[String]) -> Result<PathBuf> {
        let output = output_dir.join(self.output_name());

        match self.layout() {
            Layout::Csv => self.concatenate(&output, peptide_ids, true)?,
            Layout::Fasta => self.concatenate(&output, peptide_ids, false)?,
            Layout::Directory => self.copy_into(&output, peptide_ids)?,
        }

        debug!(
            resource = %self.kind,
            peptides = peptide_ids.len(),
            output = ?output,
            "materialized resource"
        );
        Ok(output)
    }

    fn read_source(&self, peptide_id: &str) -> Result<Vec<u8>> {
        let path = self.source_file(peptide_id);
        std::fs::read(&path).map_err(|e| {
            ExportError::SourceUnavailable {
                resource: self.kind,
                peptide_id: peptide_id.to_string(),
                path,
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn write_failed(&self, e: std::io::Error) -> crate::Error {
        ExportError::MaterializeFailed {
            resource: self.kind,
            reason: e.to_string(),
        }
        .into()
    }

    fn concatenate(&self, output: &Path, peptide_ids: &[String], skip_headers: bool) -> Result<()> {
        let file = File::create(output).map_err(|e| self.write_failed(e))?;
        let mut writer = BufWriter::new(file);

        for (index, peptide_id) in peptide_ids.iter().enumerate() {
            let content = self.read_source(peptide_id)?;
            let body = if skip_headers && index > 0 {
                strip_first_line(&content)
            } else {
                &content[..]
            };

            writer.write_all(body).map_err(|e| self.write_failed(e))?;
            if !body.is_empty() && !body.ends_with(b"\n") {
                writer.write_all(b"\n").map_err(|e| self.write_failed(e))?;
            }
        }

        writer.flush().map_err(|e| self.write_failed(e))
    }

    fn copy_into(&self, output: &Path, peptide_ids: &[String]) -> Result<()> {
        std::fs::create_dir(output).map_err(|e| self.write_failed(e))?;

        for peptide_id in peptide_ids {
            let source = self.source_file(peptide_id);
            let target = output.join(format!("{}.{}", peptide_id, self.extension()));

            if !source.is_file() {
                return Err(ExportError::SourceUnavailable {
                    resource: self.kind,
                    peptide_id: peptide_id.clone(),
                    path: source,
                    reason: "file not found".to_string(),
                }
                .into());
            }

            std::fs::copy(&source, &target).map_err(|e| self.write_failed(e))?;
        }

        Ok(())
    }
}

fn strip_first_line(content: &[u8]) -> &[u8] {
    match content.iter().position(|b| *b == b'\n') {
        Some(newline) => &content[newline + 1..],
        None => &[],
    }
}
