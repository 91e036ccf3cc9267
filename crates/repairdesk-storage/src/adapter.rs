// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the request, audit and directory traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use repairdesk_config::model::StorageConfig;
use repairdesk_core::types::{AuditEntry, NewRequest, RequestFilter, RequestId, UserId};
use repairdesk_core::{
    Actor, AdapterType, AuditEvent, AuditLog, ClaimOutcome, HealthStatus, MasterSummary,
    PluginAdapter, RepairDeskError, Request, RequestStore, Role, StatusWrite, UserDirectory,
    WriteOutcome,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules. The database is opened on the first call to
/// [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, RepairDeskError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    /// Wrap an already opened database.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), RepairDeskError> {
        let db = Database::open_with(&self.config).await?;
        self.db.set(db).map_err(|_| RepairDeskError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, RepairDeskError> {
        self.db.get().ok_or_else(|| RepairDeskError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RepairDeskError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RepairDeskError> {
        if let Some(db) = self.db.get() {
            crate::database::checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl RequestStore for SqliteStorage {
    async fn get_by_id(&self, id: RequestId) -> Result<Option<Request>, RepairDeskError> {
        queries::requests::get_request(self.database()?, id).await
    }

    async fn list(&self, filter: &RequestFilter) -> Result<Vec<Request>, RepairDeskError> {
        queries::requests::list_requests(self.database()?, filter).await
    }

    async fn create_public(
        &self,
        request: &NewRequest,
        audit: &AuditEntry,
    ) -> Result<Request, RepairDeskError> {
        queries::requests::create_request(self.database()?, request, audit).await
    }

    async fn update_status(&self, write: &StatusWrite) -> Result<WriteOutcome, RepairDeskError> {
        queries::requests::update_status(self.database()?, write).await
    }

    async fn try_claim(
        &self,
        id: RequestId,
        master_id: UserId,
        audit: &AuditEntry,
    ) -> Result<ClaimOutcome, RepairDeskError> {
        queries::requests::try_claim(self.database()?, id, master_id, audit).await
    }
}

#[async_trait]
impl AuditLog for SqliteStorage {
    async fn history(&self, request_id: RequestId) -> Result<Vec<AuditEvent>, RepairDeskError> {
        queries::audit::history(self.database()?, request_id).await
    }
}

#[async_trait]
impl UserDirectory for SqliteStorage {
    async fn upsert_user(&self, username: &str, role: Role) -> Result<UserId, RepairDeskError> {
        queries::users::upsert_user(self.database()?, username, role).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<Actor>, RepairDeskError> {
        queries::users::get_user(self.database()?, id).await
    }

    async fn list_masters(&self) -> Result<Vec<MasterSummary>, RepairDeskError> {
        queries::users::list_masters(self.database()?).await
    }
}
