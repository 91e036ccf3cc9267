// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Each [`Database`] owns one tokio-rusqlite connection, which runs every
//! statement on its own background thread. Several handles (or processes) may
//! share one file: writes take the SQLite write lock up front with
//! `BEGIN IMMEDIATE` and wait up to `busy_timeout_ms` for it.

use std::path::Path;
use std::time::Duration;

use repairdesk_config::model::StorageConfig;
use repairdesk_core::RepairDeskError;
use tracing::debug;

/// Handle to an open, migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with default storage settings.
    pub async fn open(path: &str) -> Result<Self, RepairDeskError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Open (or create) the database described by `config`, apply connection
    /// PRAGMAs and run pending migrations.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, RepairDeskError> {
        let path = config.database_path.clone();
        if path != ":memory:"
            && let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(RepairDeskError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(RepairDeskError::storage)?;

        let wal_mode = config.wal_mode;
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        conn.call(move |conn| -> Result<(), RepairDeskError> {
            apply_pragmas(conn, wal_mode, busy_timeout).map_err(RepairDeskError::storage)?;
            crate::migrations::run_migrations(conn)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => RepairDeskError::storage(other),
        })?;

        debug!(path = %path, wal_mode, "database opened and migrated");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), RepairDeskError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(RepairDeskError::storage)
    }
}

fn apply_pragmas(
    conn: &rusqlite::Connection,
    wal_mode: bool,
    busy_timeout: Duration,
) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    if wal_mode {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")?;
    Ok(())
}

/// `PRAGMA wal_checkpoint(TRUNCATE)` on the given connection.
pub(crate) async fn checkpoint(conn: &tokio_rusqlite::Connection) -> Result<(), RepairDeskError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)?;
    debug!("WAL checkpoint complete");
    Ok(())
}

/// Convert a tokio-rusqlite error into [`RepairDeskError::Storage`].
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RepairDeskError {
    RepairDeskError::Storage {
        source: Box::new(e),
    }
}
