//! Error types for peptide-tasks
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Database, Export)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Errors fall into three groups. Contract violations ([`Error::Validation`],
//! [`ExportError::NoResources`], [`ExportError::NoPeptides`],
//! [`ExportError::UnknownResource`]) are returned synchronously before any
//! side effect. Execution failures are captured by a running task and
//! persisted as its terminal failure record. Late status updates after a
//! record expired are not errors at all.

use crate::export::ResourceKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for peptide-tasks operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for peptide-tasks
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "ASSETS_LOCATION")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Export or archive building error
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Caller supplied an invalid request (bad payload, bad option, empty input)
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested task status does not exist (or expired)
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation conflicts with the current state of a task
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// ZIP archive writing error
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Background work panicked or was aborted
    #[error("task aborted: {0}")]
    TaskAborted(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Operation not supported (no aligner configured, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Export and archive building errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export form did not request a single resource
    #[error("at least one resource needs to be exported to create an archive")]
    NoResources,

    /// No peptide identifiers were supplied
    #[error("at least one peptide needs to be exported")]
    NoPeptides,

    /// A resource name that is not part of the closed resource set
    #[error("unknown export resource: {name}")]
    UnknownResource {
        /// The name that failed to resolve
        name: String,
    },

    /// A per-peptide source file for a resource is missing or unreadable
    #[error("{resource} source for peptide {peptide_id} is unavailable at {path}: {reason}")]
    SourceUnavailable {
        /// Resource being materialized
        resource: ResourceKind,
        /// Peptide whose source file failed
        peptide_id: String,
        /// Expected location of the source file
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },

    /// Writing a resource artifact into the working directory failed
    #[error("failed to materialize {resource}: {reason}")]
    MaterializeFailed {
        /// Resource being materialized
        resource: ResourceKind,
        /// The reason materialization failed
        reason: String,
    },

    /// The working directory for a build already exists
    #[error("working directory {path} already exists")]
    WorkingDirExists {
        /// The colliding directory
        path: PathBuf,
    },

    /// Compressing the working directory into the archive failed
    #[error("failed to write archive {archive}: {reason}")]
    ArchiveFailed {
        /// Target archive path
        archive: PathBuf,
        /// The reason archive creation failed
        reason: String,
    },
}

impl ExportError {
    /// Whether this error is a caller contract violation rather than an execution failure
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ExportError::NoResources | ExportError::NoPeptides | ExportError::UnknownResource { .. }
        )
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "not found: single query search task 5d0c... does not exist",
///     "details": { "task_id": "5d0c..." }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,
            Error::Export(e) if e.is_contract_violation() => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict
            Error::Conflict(_) => 409,

            // 422 Unprocessable Entity - Semantic errors while exporting
            Error::Export(_) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::Zip(_) => 500,
            Error::TaskAborted(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 501 Not Implemented - Feature not supported
            Error::NotSupported(_) => 501,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Export(e) => match e {
                ExportError::NoResources => "no_resources",
                ExportError::NoPeptides => "no_peptides",
                ExportError::UnknownResource { .. } => "unknown_resource",
                ExportError::SourceUnavailable { .. } => "source_unavailable",
                ExportError::MaterializeFailed { .. } => "materialize_failed",
                ExportError::WorkingDirExists { .. } => "working_dir_exists",
                ExportError::ArchiveFailed { .. } => "archive_failed",
            },
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Zip(_) => "archive_error",
            Error::TaskAborted(_) => "task_aborted",
            Error::ApiServerError(_) => "api_server_error",
            Error::NotSupported(_) => "not_supported",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Export(ExportError::UnknownResource { name }) => Some(serde_json::json!({
                "resource": name,
            })),
            Error::Export(ExportError::SourceUnavailable {
                resource,
                peptide_id,
                ..
            }) => Some(serde_json::json!({
                "resource": resource,
                "peptide_id": peptide_id,
            })),
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}
