//! Base64 peptide selection bitmaps.
//!
//! Text-query exports identify peptides by a bitmap over the catalogue: bit
//! `i` (most significant bit of each byte first) selects the peptide with
//! index `i`.

use crate::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::format_peptide_id;

/// Decode a base64 bitmap into one flag per bit
pub fn decode_selection(encoded: &str) -> Result<Vec<bool>> {
    if encoded.is_empty() {
        return Err(Error::Validation(
            "Cannot convert from empty base64 string.".to_string(),
        ));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| Error::Validation("Invalid base64 string provided.".to_string()))?;

    Ok(bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| (byte >> bit) & 1 == 1))
        .collect())
}

/// Indices of the set bits of a base64 bitmap
pub fn selected_indices(encoded: &str) -> Result<Vec<usize>> {
    Ok(decode_selection(encoded)?
        .into_iter()
        .enumerate()
        .filter_map(|(index, selected)| selected.then_some(index))
        .collect())
}

/// Peptide identifiers selected by a base64 bitmap
pub fn selected_peptide_ids(encoded: &str) -> Result<Vec<String>> {
    Ok(selected_indices(encoded)?
        .into_iter()
        .map(format_peptide_id)
        .collect())
}
