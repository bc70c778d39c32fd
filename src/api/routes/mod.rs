//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`search`] — Single and multi query alignment tasks
//! - [`export`] — Archive export tasks
//! - [`system`] — Health

use crate::error::{Error, Result};
use crate::export::ExportForm;
use crate::types::TaskId;
use serde::{Deserialize, Serialize};

mod export;
mod search;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use export::*;
pub use search::*;
pub use system::*;

/// Media type required for FASTA request bodies
pub const CONTENT_TYPE_FASTA: &str = "text/x-fasta";

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /search/{single,multi}-query/:id
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PageQuery {
    /// 1-based page of the result list (default: 1)
    pub page: Option<String>,
}

/// Request body for POST /export/{single,multi,text}-query
///
/// `data` is the search task id for `single` and `multi` exports and the
/// base64 selection bitmap for `text` exports.
#[derive(Debug, Deserialize, Serialize)]
pub struct ExportRequest {
    /// Export kind: `text`, `single` or `multi`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Requested resources
    #[serde(default)]
    pub form: ExportForm,
    /// Search task id or selection bitmap
    #[serde(default)]
    pub data: Option<String>,
}

const PAYLOAD_TYPES: [&str; 3] = ["text", "single", "multi"];

impl ExportRequest {
    /// Validate the payload for an endpoint that handles `expected` exports
    ///
    /// Returns the non-empty `data` string.
    pub fn validate(&self, expected: &str) -> Result<&str> {
        if !PAYLOAD_TYPES.contains(&self.kind.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid payload type, must be one of: {}",
                PAYLOAD_TYPES.join(", ")
            )));
        }
        if !self.form.is_valid() {
            return Err(Error::Validation(
                "Form needs to have at least one item set to true.".to_string(),
            ));
        }
        let data = self
            .data
            .as_deref()
            .filter(|data| !data.is_empty())
            .ok_or_else(|| Error::Validation("Data needs to be a non-empty string.".to_string()))?;
        if self.kind != expected {
            return Err(Error::Validation(format!(
                "This endpoint only handles exporting {}-query searches.",
                expected
            )));
        }

        Ok(data)
    }
}

/// Parse a task id from a path segment
///
/// Ids that are not UUIDs cannot name a task, so they are reported the same
/// way as unknown ids.
fn parse_task_id(raw: &str, not_found: impl FnOnce() -> String) -> Result<TaskId> {
    raw.parse().map_err(|_| Error::NotFound(not_found()))
}
