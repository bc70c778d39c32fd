//! Core types for peptide-tasks

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a background task
///
/// Generated once at task construction from a random UUIDv4 and never reused.
/// Serialized as the hyphenated string form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Key namespace a task's status record lives in
///
/// Each namespace has its own record lifetime (see [`TaskConfig`](crate::config::TaskConfig)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Alignment search tasks
    Search,
    /// Archive export tasks
    Export,
}

impl Namespace {
    /// The key prefix for this namespace
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Search => "search",
            Namespace::Export => "export",
        }
    }

    /// Storage key for a task id: `{namespace}:{task_id}`
    pub fn key(&self, id: TaskId) -> String {
        format!("{}:{}", self.as_str(), id)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
