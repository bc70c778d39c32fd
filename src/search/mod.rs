//! Sequence search inputs and the alignment seam
//!
//! The scoring algorithm itself lives outside this crate. Search tasks parse
//! and validate the query (FASTA text plus [`SingleAlignmentOptions`] or
//! [`MultiAlignmentOptions`]) and hand it to an [`Aligner`] implementation.
//!
//! - [`NoOpAligner`]: stub that reports alignment as unsupported

mod aligner;
mod fasta;
mod options;

pub use aligner::{Aligner, MultiAlignedPeptide, NoOpAligner, SingleAlignedPeptide};
pub use fasta::{
    QueryRecord, is_multi_fasta_valid, is_single_fasta_valid, parse_fasta,
    replace_ambiguous_amino_acids,
};
pub use options::{
    Algorithm, Criterion, MultiAlignmentOptions, SingleAlignmentOptions, SubstitutionMatrix,
};
