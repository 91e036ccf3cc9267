// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use repairdesk_core::RepairDeskError;
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), RepairDeskError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(RepairDeskError::storage)?;
    for migration in report.applied_migrations() {
        debug!(migration = %migration, "migration applied");
    }
    Ok(())
}
