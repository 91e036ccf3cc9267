// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit trail append and history.

use repairdesk_core::types::{AuditEntry, RequestId};
use repairdesk_core::{AuditEvent, RepairDeskError};
use rusqlite::params;

use crate::database::Database;
use crate::models::{AUDIT_SELECT, audit_event_from_row};

/// Append an event inside the caller's transaction.
pub(crate) fn insert_event(
    conn: &rusqlite::Connection,
    request_id: RequestId,
    entry: &AuditEntry,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO request_audit_events
             (request_id, action, actor_id, actor_username, old_status, new_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            request_id,
            entry.action.to_string(),
            entry.actor_id,
            entry.actor_username,
            entry.old_status.map(|s| s.as_str()),
            entry.new_status.map(|s| s.as_str()),
        ],
    )?;
    Ok(())
}

/// Events for one request, oldest first.
pub async fn history(
    db: &Database,
    request_id: RequestId,
) -> Result<Vec<AuditEvent>, RepairDeskError> {
    db.connection()
        .call(move |conn| {
            let sql =
                format!("{AUDIT_SELECT} WHERE request_id = ?1 ORDER BY created_at ASC, id ASC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![request_id], audit_event_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
