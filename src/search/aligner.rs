//! Alignment seam and its result types.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{MultiAlignmentOptions, QueryRecord, SingleAlignmentOptions};

/// A catalogue peptide scored against a single query
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleAlignedPeptide {
    /// Catalogue identifier (`starPep_00042`)
    pub id: String,
    /// Residue sequence
    pub sequence: String,
    /// Sequence length
    pub length: usize,
    /// Normalized alignment score
    pub score: f64,
}

/// A catalogue peptide scored against several queries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiAlignedPeptide {
    /// Catalogue identifier (`starPep_00042`)
    pub id: String,
    /// Residue sequence
    pub sequence: String,
    /// Sequence length
    pub length: usize,
    /// Score selected by the search criterion
    pub score: f64,
    /// Mean score across queries
    pub avg_score: f64,
    /// Best score across queries
    pub max_score: f64,
    /// Worst score across queries
    pub min_score: f64,
}

/// Scores catalogue peptides against query sequences
///
/// Implementations own access to the peptide catalogue. Query sequences are
/// passed with ambiguous residues already replaced. Results are expected in
/// ranking order, already filtered by `threshold` and truncated to
/// `max_quantity`.
#[async_trait]
pub trait Aligner: Send + Sync {
    /// Align one query against the catalogue
    async fn align_single(
        &self,
        query: &QueryRecord,
        options: &SingleAlignmentOptions,
    ) -> Result<Vec<SingleAlignedPeptide>>;

    /// Align several queries against the catalogue
    async fn align_multi(
        &self,
        queries: &[QueryRecord],
        options: &MultiAlignmentOptions,
    ) -> Result<Vec<MultiAlignedPeptide>>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}

/// Aligner used when no scoring backend is configured
///
/// Every alignment fails with `Error::NotSupported`, so search tasks end in a
/// failure record instead of hanging.
pub struct NoOpAligner;

#[async_trait]
impl Aligner for NoOpAligner {
    async fn align_single(
        &self,
        _query: &QueryRecord,
        _options: &SingleAlignmentOptions,
    ) -> Result<Vec<SingleAlignedPeptide>> {
        Err(Error::NotSupported(
            "sequence alignment requires a configured aligner backend".into(),
        ))
    }

    async fn align_multi(
        &self,
        _queries: &[QueryRecord],
        _options: &MultiAlignmentOptions,
    ) -> Result<Vec<MultiAlignedPeptide>> {
        Err(Error::NotSupported(
            "sequence alignment requires a configured aligner backend".into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
