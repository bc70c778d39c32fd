//! TTL-scoped task status records.
//!
//! Rows carry an absolute `expires_at` in Unix milliseconds. Reads and
//! conditional updates treat an expired row exactly like a missing one, so
//! correctness never depends on [`Database::purge_expired_statuses`] running.

use crate::error::DatabaseError;
use crate::{Error, Result};
use std::time::Duration;

use super::Database;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Database {
    /// Write a status record with a fresh lifetime
    ///
    /// Overwrites any existing row for `key`, including its expiry.
    pub async fn put_status(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_millis().saturating_add(ttl_ms);

        sqlx::query(
            r#"
            INSERT INTO task_status (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to write status {}: {}",
                key, e
            )))
        })?;

        Ok(())
    }

    /// Replace the value of a live, still loading status record, keeping its
    /// expiry
    ///
    /// Returns `false` without writing anything when the row is missing, has
    /// already expired or holds a terminal record (`loading` is not `true`).
    /// Stored values must be JSON objects.
    pub async fn replace_status(&self, key: &str, value: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE task_status SET value = ?
            WHERE key = ? AND expires_at > ? AND json_extract(value, '$.loading') = 1
            "#,
        )
        .bind(value)
        .bind(key)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update status {}: {}",
                key, e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the raw value of a live status record
    pub async fn get_status(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
            SELECT value FROM task_status WHERE key = ? AND expires_at > ?
            "#,
        )
        .bind(key)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to read status {}: {}",
                key, e
            )))
        })?;

        Ok(value)
    }

    /// Get the expiry timestamp (Unix milliseconds) of a live status record
    pub async fn status_expires_at(&self, key: &str) -> Result<Option<i64>> {
        let expires_at: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT expires_at FROM task_status WHERE key = ? AND expires_at > ?
            "#,
        )
        .bind(key)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to read status expiry {}: {}",
                key, e
            )))
        })?;

        Ok(expires_at)
    }

    /// Delete every expired status record
    ///
    /// Returns the number of rows removed.
    pub async fn purge_expired_statuses(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM task_status WHERE expires_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to purge expired statuses: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }
}
