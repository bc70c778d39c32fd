//! Alignment options parsed from query parameters.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alignment mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Needleman-Wunsch style global alignment
    Global,
    /// Smith-Waterman style local alignment
    #[default]
    Local,
}

impl std::str::FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "global" => Ok(Algorithm::Global),
            "local" => Ok(Algorithm::Local),
            _ => Err(Error::Validation(
                "alg must be one of: global, local".to_string(),
            )),
        }
    }
}

/// Substitution matrix used for scoring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubstitutionMatrix {
    /// BLOSUM45
    #[serde(rename = "BLOSUM45")]
    Blosum45,
    /// BLOSUM50
    #[serde(rename = "BLOSUM50")]
    Blosum50,
    /// BLOSUM62
    #[default]
    #[serde(rename = "BLOSUM62")]
    Blosum62,
    /// BLOSUM80
    #[serde(rename = "BLOSUM80")]
    Blosum80,
    /// BLOSUM90
    #[serde(rename = "BLOSUM90")]
    Blosum90,
    /// PAM30
    #[serde(rename = "PAM30")]
    Pam30,
    /// PAM70
    #[serde(rename = "PAM70")]
    Pam70,
    /// PAM250
    #[serde(rename = "PAM250")]
    Pam250,
}

impl SubstitutionMatrix {
    /// Every supported matrix
    pub const ALL: [SubstitutionMatrix; 8] = [
        SubstitutionMatrix::Blosum45,
        SubstitutionMatrix::Blosum50,
        SubstitutionMatrix::Blosum62,
        SubstitutionMatrix::Blosum80,
        SubstitutionMatrix::Blosum90,
        SubstitutionMatrix::Pam30,
        SubstitutionMatrix::Pam70,
        SubstitutionMatrix::Pam250,
    ];

    /// Conventional matrix name (e.g. `BLOSUM62`)
    pub fn as_str(&self) -> &'static str {
        match self {
            SubstitutionMatrix::Blosum45 => "BLOSUM45",
            SubstitutionMatrix::Blosum50 => "BLOSUM50",
            SubstitutionMatrix::Blosum62 => "BLOSUM62",
            SubstitutionMatrix::Blosum80 => "BLOSUM80",
            SubstitutionMatrix::Blosum90 => "BLOSUM90",
            SubstitutionMatrix::Pam30 => "PAM30",
            SubstitutionMatrix::Pam70 => "PAM70",
            SubstitutionMatrix::Pam250 => "PAM250",
        }
    }
}

impl std::str::FromStr for SubstitutionMatrix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SubstitutionMatrix::ALL
            .into_iter()
            .find(|matrix| matrix.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = SubstitutionMatrix::ALL.iter().map(|m| m.as_str()).collect();
                Error::Validation(format!("matrix must be one of: {}", names.join(", ")))
            })
    }
}

/// How per-query scores are combined in a multi query search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Rank by mean score across queries
    #[default]
    Avg,
    /// Rank by best score across queries
    Max,
    /// Rank by worst score across queries
    Min,
}

impl std::str::FromStr for Criterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avg" => Ok(Criterion::Avg),
            "max" => Ok(Criterion::Max),
            "min" => Ok(Criterion::Min),
            _ => Err(Error::Validation(
                "criterion must be one of: avg, max, min".to_string(),
            )),
        }
    }
}

/// Options for a single query search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleAlignmentOptions {
    /// Alignment mode (default: local)
    pub alg: Algorithm,
    /// Scoring matrix (default: BLOSUM62)
    pub matrix: SubstitutionMatrix,
    /// Minimum normalized score in `(0, 1]` (default: 1.0)
    pub threshold: f64,
    /// Maximum number of hits to return (default: unlimited)
    pub max_quantity: Option<u32>,
}

impl Default for SingleAlignmentOptions {
    fn default() -> Self {
        Self {
            alg: Algorithm::default(),
            matrix: SubstitutionMatrix::default(),
            threshold: 1.0,
            max_quantity: None,
        }
    }
}

impl SingleAlignmentOptions {
    /// Validate options from raw query parameters
    ///
    /// Missing or empty parameters take their defaults.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(alg) = param(params, "alg") {
            options.alg = alg.parse()?;
        }
        if let Some(matrix) = param(params, "matrix") {
            options.matrix = matrix.parse()?;
        }
        if let Some(threshold) = param(params, "threshold") {
            let threshold: f64 = threshold
                .parse()
                .map_err(|_| Error::Validation("threshold must be a number.".to_string()))?;
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(Error::Validation(
                    "threshold must be between 0 and 1.".to_string(),
                ));
            }
            options.threshold = threshold;
        }
        if let Some(max_quantity) = param(params, "max_quantity") {
            let max_quantity: i64 = max_quantity
                .parse()
                .map_err(|_| Error::Validation("max_quantity must be an integer.".to_string()))?;
            if max_quantity < 1 {
                return Err(Error::Validation(
                    "max_quantity must be at least 1.".to_string(),
                ));
            }
            options.max_quantity = Some(u32::try_from(max_quantity).unwrap_or(u32::MAX));
        }

        Ok(options)
    }
}

/// Options for a multi query search
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiAlignmentOptions {
    /// Per-query alignment options
    #[serde(flatten)]
    pub single: SingleAlignmentOptions,
    /// Score combination across queries (default: avg)
    pub criterion: Criterion,
}

impl MultiAlignmentOptions {
    /// Validate options from raw query parameters
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let single = SingleAlignmentOptions::from_params(params)?;
        let criterion = match param(params, "criterion") {
            Some(criterion) => criterion.parse()?,
            None => Criterion::default(),
        };

        Ok(Self { single, criterion })
    }
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
