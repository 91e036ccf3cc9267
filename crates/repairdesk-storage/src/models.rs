// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the domain types.
//!
//! The canonical types live in `repairdesk-core::types`; enums are stored as
//! their snake_case text form.

use std::str::FromStr;

use rusqlite::Row;
use rusqlite::types::Type;

pub use repairdesk_core::types::{Actor, AuditEvent, MasterSummary, Request};

/// Columns selected by [`request_from_row`], in order.
pub(crate) const REQUEST_SELECT: &str = "SELECT r.id, r.description, r.status, r.client_name, \
     r.client_phone, r.address, r.master_id, u.username, r.created_at, r.updated_at \
     FROM repair_requests r LEFT JOIN users u ON u.id = r.master_id";

/// Columns selected by [`audit_event_from_row`], in order.
pub(crate) const AUDIT_SELECT: &str = "SELECT id, request_id, action, actor_id, actor_username, \
     old_status, new_status, created_at FROM request_audit_events";

pub(crate) fn request_from_row(row: &Row<'_>) -> rusqlite::Result<Request> {
    Ok(Request {
        id: row.get(0)?,
        description: row.get(1)?,
        status: parse_text(row, 2)?,
        client_name: row.get(3)?,
        client_phone: row.get(4)?,
        address: row.get(5)?,
        master_id: row.get(6)?,
        master_username: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(crate) fn audit_event_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEvent> {
    Ok(AuditEvent {
        id: row.get(0)?,
        request_id: row.get(1)?,
        action: parse_text(row, 2)?,
        actor_id: row.get(3)?,
        actor_username: row.get(4)?,
        old_status: parse_optional_text(row, 5)?,
        new_status: parse_optional_text(row, 6)?,
        created_at: row.get(7)?,
    })
}

/// Read a text column and parse it into an enum.
pub(crate) fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    parse_value(idx, &raw)
}

fn parse_optional_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse_value(idx, &raw)).transpose()
}

pub(crate) fn parse_value<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use repairdesk_core::RequestStatus;

    #[test]
    fn unknown_status_is_a_conversion_failure() {
        let err = parse_value::<RequestStatus>(2, "archived").unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, _)
        ));
    }

    #[test]
    fn known_status_parses() {
        let status: RequestStatus = parse_value(0, "in_progress").unwrap();
        assert_eq!(status, RequestStatus::InProgress);
    }
}
