//! Persisted task status records.

use crate::types::TaskId;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Where a task is in its lifecycle
#[derive(Clone, Debug, PartialEq)]
pub enum TaskState<D> {
    /// Work is in flight, optionally with a partial result
    Pending {
        /// Latest partial result, if the task reports progress
        progress: Option<D>,
    },
    /// Work finished with a result
    Succeeded(D),
    /// Work failed; carries the human-readable error
    Failed(String),
}

/// The pollable status of one task
///
/// On the wire this is the flat object
/// `{id, name, loading, success, context, data}`. `data` holds the partial
/// result while loading, the result on success and the error message on
/// failure. Records that break that shape (for example a successful record
/// without data) fail to deserialize.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskStatus<C, D> {
    /// Task identifier
    pub id: TaskId,
    /// Task kind discriminator (e.g. `single_query`)
    pub name: String,
    /// Immutable creation context (e.g. the echoed request options)
    pub context: Option<C>,
    /// Lifecycle state and payload
    pub state: TaskState<D>,
}

impl<C, D> TaskStatus<C, D> {
    /// A loading record without progress
    pub fn pending(id: TaskId, name: impl Into<String>, context: Option<C>) -> Self {
        Self {
            id,
            name: name.into(),
            context,
            state: TaskState::Pending { progress: None },
        }
    }

    /// A loading record carrying a partial result
    pub fn in_progress(id: TaskId, name: impl Into<String>, context: Option<C>, progress: D) -> Self {
        Self {
            id,
            name: name.into(),
            context,
            state: TaskState::Pending {
                progress: Some(progress),
            },
        }
    }

    /// A terminal success record
    pub fn succeeded(id: TaskId, name: impl Into<String>, context: Option<C>, data: D) -> Self {
        Self {
            id,
            name: name.into(),
            context,
            state: TaskState::Succeeded(data),
        }
    }

    /// A terminal failure record
    pub fn failed(
        id: TaskId,
        name: impl Into<String>,
        context: Option<C>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            context,
            state: TaskState::Failed(error.into()),
        }
    }

    /// Whether work is still in flight
    pub fn is_loading(&self) -> bool {
        matches!(self.state, TaskState::Pending { .. })
    }

    /// Whether work finished successfully
    pub fn is_success(&self) -> bool {
        matches!(self.state, TaskState::Succeeded(_))
    }

    /// The final result, if the task succeeded
    pub fn result(&self) -> Option<&D> {
        match &self.state {
            TaskState::Succeeded(data) => Some(data),
            _ => None,
        }
    }

    /// The error message, if the task failed
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            TaskState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum DataRef<'a, D> {
    Value(&'a D),
    Message(&'a str),
}

#[derive(Serialize)]
struct RecordRef<'a, C, D> {
    id: TaskId,
    name: &'a str,
    loading: bool,
    success: bool,
    context: Option<&'a C>,
    data: Option<DataRef<'a, D>>,
}

#[derive(Deserialize)]
struct RawRecord<C> {
    id: TaskId,
    name: String,
    loading: bool,
    success: bool,
    context: Option<C>,
    #[serde(default)]
    data: serde_json::Value,
}

impl<C: Serialize, D: Serialize> Serialize for TaskStatus<C, D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (loading, success, data) = match &self.state {
            TaskState::Pending { progress } => (true, false, progress.as_ref().map(DataRef::Value)),
            TaskState::Succeeded(data) => (false, true, Some(DataRef::Value(data))),
            TaskState::Failed(message) => (false, false, Some(DataRef::Message(message.as_str()))),
        };

        RecordRef {
            id: self.id,
            name: &self.name,
            loading,
            success,
            context: self.context.as_ref(),
            data,
        }
        .serialize(serializer)
    }
}

impl<'de, C: DeserializeOwned, D: DeserializeOwned> Deserialize<'de> for TaskStatus<C, D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let raw = RawRecord::<C>::deserialize(deserializer)?;

        let state = match (raw.loading, raw.success, raw.data) {
            (true, true, _) => {
                return Err(De::Error::custom("in-flight status cannot be successful"));
            }
            (true, false, serde_json::Value::Null) => TaskState::Pending { progress: None },
            (true, false, data) => TaskState::Pending {
                progress: Some(serde_json::from_value(data).map_err(De::Error::custom)?),
            },
            (false, true, serde_json::Value::Null) => {
                return Err(De::Error::custom("successful status without data"));
            }
            (false, true, data) => {
                TaskState::Succeeded(serde_json::from_value(data).map_err(De::Error::custom)?)
            }
            (false, false, serde_json::Value::Null) => {
                return Err(De::Error::custom("failed status without error message"));
            }
            (false, false, serde_json::Value::String(message)) => TaskState::Failed(message),
            (false, false, other) => TaskState::Failed(other.to_string()),
        };

        Ok(TaskStatus {
            id: raw.id,
            name: raw.name,
            context: raw.context,
            state,
        })
    }
}

/// Just enough of a record to check which task kind wrote it
#[derive(Deserialize)]
pub(crate) struct RecordHeader {
    pub(crate) name: String,
}
