// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Users directory queries.

use repairdesk_core::types::UserId;
use repairdesk_core::{Actor, MasterSummary, RepairDeskError, Role};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::parse_text;

/// Insert the user unless the username exists. Returns the stored id.
///
/// An existing user keeps its role.
pub async fn upsert_user(
    db: &Database,
    username: &str,
    role: Role,
) -> Result<UserId, RepairDeskError> {
    let username = username.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (username, role) VALUES (?1, ?2)
                 ON CONFLICT(username) DO NOTHING",
                params![username, role.to_string()],
            )?;
            conn.query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look a user up by id.
pub async fn get_user(db: &Database, id: UserId) -> Result<Option<Actor>, RepairDeskError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, username, role FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Actor {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        role: parse_text(row, 2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Users with the master role, ordered by username.
pub async fn list_masters(db: &Database) -> Result<Vec<MasterSummary>, RepairDeskError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username FROM users WHERE role = 'master' ORDER BY username ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(MasterSummary {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
