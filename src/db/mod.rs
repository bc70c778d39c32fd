//! Database layer for peptide-tasks
//!
//! Handles SQLite persistence for task status records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`status`] — TTL-scoped status records (create, conditional update, read, purge)

use sqlx::sqlite::SqlitePool;

mod migrations;
mod status;

/// Database handle for peptide-tasks
///
/// Constructed once by the composition root and shared as `Arc<Database>`
/// between the task executor and every status store.
pub struct Database {
    pool: SqlitePool,
}
