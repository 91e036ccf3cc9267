// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `repairdesk migrate` command implementation.

use repairdesk_config::model::RepairDeskConfig;
use repairdesk_core::RepairDeskError;
use repairdesk_storage::Database;
use tracing::info;

/// Open the database, which applies any pending migrations, then close it.
pub async fn run_migrate(config: RepairDeskConfig) -> Result<(), RepairDeskError> {
    crate::init_tracing(&config.service.log_level);

    let db = Database::open_with(&config.storage).await?;
    db.close().await?;

    info!(path = %config.storage.database_path, "migrations applied");
    println!("repairdesk: database at {} is up to date", config.storage.database_path);
    Ok(())
}
