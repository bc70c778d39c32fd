//! Resource export: forms, per-resource handlers and the archive builder
//!
//! An export turns a list of peptide identifiers plus an [`ExportForm`] into a
//! single ZIP archive. Each requested [`ResourceKind`] is materialized by its
//! [`ResourceHandler`] into a scratch directory, which the [`ArchiveBuilder`]
//! then compresses and removes.

use crate::error::{Error, ExportError};
use serde::{Deserialize, Serialize};

mod archive;
mod bitmap;
mod handlers;

pub use archive::{ArchiveBuilder, NoProgress, ProgressSink};
pub use bitmap::{decode_selection, selected_indices, selected_peptide_ids};
pub use handlers::ResourceHandler;

/// Format a numeric peptide index as its catalogue identifier (`starPep_00042`)
pub fn format_peptide_id(index: usize) -> String {
    format!("starPep_{:05}", index)
}

/// Closed set of exportable resource kinds
///
/// Variants are listed in the order resources are materialized. The
/// serialized names match the [`ExportForm`] keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Physico-chemical attributes (CSV)
    #[serde(rename = "attributes")]
    Attributes,
    /// Sequences (FASTA)
    #[serde(rename = "fasta")]
    Fasta,
    /// Catalogue metadata (CSV)
    #[serde(rename = "metadata")]
    Metadata,
    /// Mean ESM embeddings (CSV)
    #[serde(rename = "esmMean")]
    EsmMean,
    /// iFeature amino acid composition (CSV)
    #[serde(rename = "iFeatureAac")]
    IFeatureAac,
    /// iFeature dipeptide composition (CSV)
    #[serde(rename = "iFeatureDpc")]
    IFeatureDpc,
    /// Predicted structures (PDB)
    #[serde(rename = "pdb")]
    Pdb,
}

impl ResourceKind {
    /// Every resource kind in declared order
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Attributes,
        ResourceKind::Fasta,
        ResourceKind::Metadata,
        ResourceKind::EsmMean,
        ResourceKind::IFeatureAac,
        ResourceKind::IFeatureDpc,
        ResourceKind::Pdb,
    ];

    /// The serialized name of this resource
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Attributes => "attributes",
            ResourceKind::Metadata => "metadata",
            ResourceKind::Fasta => "fasta",
            ResourceKind::EsmMean => "esmMean",
            ResourceKind::IFeatureAac => "iFeatureAac",
            ResourceKind::IFeatureDpc => "iFeatureDpc",
            ResourceKind::Pdb => "pdb",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                Error::Export(ExportError::UnknownResource {
                    name: s.to_string(),
                })
            })
    }
}

/// Which resources an export should contain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportForm {
    /// Include `attributes.csv`
    pub attributes: bool,
    /// Include `peptides.fasta`
    pub fasta: bool,
    /// Include `metadata.csv`
    pub metadata: bool,
    /// Include `esm-mean.csv`
    #[serde(rename = "esmMean")]
    pub esm_mean: bool,
    /// Include `ifeature-aac-20.csv`
    #[serde(rename = "iFeatureAac")]
    pub i_feature_aac: bool,
    /// Include `ifeature-dpc-400.csv`
    #[serde(rename = "iFeatureDpc")]
    pub i_feature_dpc: bool,
    /// Include the `pdb/` directory
    pub pdb: bool,
}

impl ExportForm {
    /// Build a form with exactly the given resources set
    pub fn with_resources(resources: &[ResourceKind]) -> Self {
        let mut form = Self::default();
        for resource in resources {
            *form.flag_mut(*resource) = true;
        }
        form
    }

    fn flag(&self, resource: ResourceKind) -> bool {
        match resource {
            ResourceKind::Attributes => self.attributes,
            ResourceKind::Metadata => self.metadata,
            ResourceKind::Fasta => self.fasta,
            ResourceKind::EsmMean => self.esm_mean,
            ResourceKind::IFeatureAac => self.i_feature_aac,
            ResourceKind::IFeatureDpc => self.i_feature_dpc,
            ResourceKind::Pdb => self.pdb,
        }
    }

    fn flag_mut(&mut self, resource: ResourceKind) -> &mut bool {
        match resource {
            ResourceKind::Attributes => &mut self.attributes,
            ResourceKind::Metadata => &mut self.metadata,
            ResourceKind::Fasta => &mut self.fasta,
            ResourceKind::EsmMean => &mut self.esm_mean,
            ResourceKind::IFeatureAac => &mut self.i_feature_aac,
            ResourceKind::IFeatureDpc => &mut self.i_feature_dpc,
            ResourceKind::Pdb => &mut self.pdb,
        }
    }

    /// Requested resources in declared order
    pub fn exportable_resources(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.flag(*kind))
            .collect()
    }

    /// Whether at least one resource is requested
    pub fn is_valid(&self) -> bool {
        ResourceKind::ALL.into_iter().any(|kind| self.flag(kind))
    }
}

/// Progress and outcome of an export task
///
/// `done` grows by one entry per materialized resource, in declared order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    /// Peptides being exported
    pub peptide_ids: Vec<String>,
    /// Number of peptides being exported
    pub total: usize,
    /// The requested resources
    pub form: ExportForm,
    /// Resources materialized so far
    pub done: Vec<ResourceKind>,
}

impl ExportResult {
    /// Fresh result with no resources done yet
    pub fn new(peptide_ids: Vec<String>, form: ExportForm) -> Self {
        Self {
            total: peptide_ids.len(),
            peptide_ids,
            form,
            done: Vec::new(),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
