//! FASTA query parsing.

/// One record of a FASTA query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRecord {
    /// First word of the header line
    pub id: String,
    /// Full header line without the leading `>`
    pub description: String,
    /// Residues with all whitespace removed
    pub sequence: String,
}

impl QueryRecord {
    /// The sequence with ambiguous residues replaced
    pub fn normalized_sequence(&self) -> String {
        replace_ambiguous_amino_acids(&self.sequence)
    }
}

/// Parse FASTA text into records
///
/// Text before the first header line is ignored. A header without residues
/// yields a record with an empty sequence.
pub fn parse_fasta(text: &str) -> Vec<QueryRecord> {
    let mut records: Vec<QueryRecord> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(header) = line.strip_prefix('>') {
            let description = header.trim().to_string();
            let id = description
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            records.push(QueryRecord {
                id,
                description,
                sequence: String::new(),
            });
        } else if let Some(current) = records.last_mut() {
            current
                .sequence
                .extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }

    records
}

/// A single-query body holds exactly one non-empty record
pub fn is_single_fasta_valid(records: &[QueryRecord]) -> bool {
    matches!(records, [record] if !record.sequence.is_empty())
}

/// A multi-query body holds at least one record and none is empty
pub fn is_multi_fasta_valid(records: &[QueryRecord]) -> bool {
    !records.is_empty() && records.iter().all(|record| !record.sequence.is_empty())
}

/// Map non-standard residues onto their closest standard amino acid
///
/// Pyrrolysine (O) becomes lysine (K), leucine/isoleucine (J) becomes
/// leucine (L) and selenocysteine (U) becomes cysteine (C).
pub fn replace_ambiguous_amino_acids(sequence: &str) -> String {
    sequence
        .chars()
        .map(|c| match c {
            'O' => 'K',
            'J' => 'L',
            'U' => 'C',
            other => other,
        })
        .collect()
}
