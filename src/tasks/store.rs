//! Namespaced, TTL-scoped status storage.

use crate::db::Database;
use crate::error::Result;
use crate::types::{Namespace, TaskId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::status::{RecordHeader, TaskStatus};

/// Status records for one namespace
///
/// `create` starts a record's lifetime; `update` only rewrites records that
/// are still alive and loading, and never extends their lifetime. An update
/// after expiry or after a terminal record was written is dropped: it returns
/// `Ok(false)` and is not an error.
#[derive(Clone)]
pub struct StatusStore {
    db: Arc<Database>,
    namespace: Namespace,
    ttl: Duration,
}

impl StatusStore {
    /// Create a store for `namespace` whose records live for `ttl`
    pub fn new(db: Arc<Database>, namespace: Namespace, ttl: Duration) -> Self {
        Self { db, namespace, ttl }
    }

    /// The namespace records are keyed under
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Lifetime applied by [`StatusStore::create`]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Write `status` with a fresh lifetime, replacing any existing record
    pub async fn create<C: Serialize, D: Serialize>(&self, status: &TaskStatus<C, D>) -> Result<()> {
        let key = self.namespace.key(status.id);
        let value = serde_json::to_string(status)?;
        self.db.put_status(&key, &value, self.ttl).await
    }

    /// Overwrite a live loading record with `status`, keeping its expiry
    ///
    /// Returns `false` when no live record exists or the record is terminal.
    pub async fn update<C: Serialize, D: Serialize>(&self, status: &TaskStatus<C, D>) -> Result<bool> {
        let key = self.namespace.key(status.id);
        let value = serde_json::to_string(status)?;
        let written = self.db.replace_status(&key, &value).await?;

        if !written {
            debug!(key = %key, "status update dropped, record missing, expired or terminal");
        }
        Ok(written)
    }

    /// Read a record, or `None` if it is missing, expired or unreadable
    pub async fn get<C: DeserializeOwned, D: DeserializeOwned>(
        &self,
        id: TaskId,
    ) -> Result<Option<TaskStatus<C, D>>> {
        let key = self.namespace.key(id);
        let Some(value) = self.db.get_status(&key).await? else {
            return Ok(None);
        };

        Ok(decode(&key, &value))
    }

    /// Read a record written by the task kind `name`
    ///
    /// Records of any other kind are reported as missing.
    pub async fn get_named<C: DeserializeOwned, D: DeserializeOwned>(
        &self,
        id: TaskId,
        name: &str,
    ) -> Result<Option<TaskStatus<C, D>>> {
        let key = self.namespace.key(id);
        let Some(value) = self.db.get_status(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<RecordHeader>(&value) {
            Ok(header) if header.name == name => Ok(decode(&key, &value)),
            Ok(header) => {
                debug!(key = %key, expected = name, found = %header.name, "status belongs to another task kind");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "unreadable status record");
                Ok(None)
            }
        }
    }

    /// Remaining lifetime of a live record
    pub async fn remaining_ttl(&self, id: TaskId) -> Result<Option<Duration>> {
        let key = self.namespace.key(id);
        let now = chrono::Utc::now().timestamp_millis();

        Ok(self
            .db
            .status_expires_at(&key)
            .await?
            .map(|expires_at| Duration::from_millis(expires_at.saturating_sub(now).max(0) as u64)))
    }
}

fn decode<C: DeserializeOwned, D: DeserializeOwned>(key: &str, value: &str) -> Option<TaskStatus<C, D>> {
    match serde_json::from_str(value) {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(key = %key, error = %e, "unreadable status record");
            None
        }
    }
}
