// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repair request reads and guarded writes.
//!
//! Every write runs in one `BEGIN IMMEDIATE` transaction that covers the
//! conditional UPDATE, the audit append and the re-read of the post-write
//! projection. A write whose WHERE clause matches no row rolls back untouched.

use repairdesk_core::types::{AuditEntry, NewRequest, RequestFilter, RequestId, UserId};
use repairdesk_core::{
    ClaimOutcome, MasterExpectation, RepairDeskError, Request, RequestStatus, StatusWrite,
    WriteOutcome,
};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;
use crate::models::{REQUEST_SELECT, parse_value, request_from_row};
use crate::queries::audit::insert_event;

/// New `updated_at` for a mutated row: the current time, or one millisecond
/// past the previous value when the clock has not moved past it.
const NEXT_UPDATED_AT: &str = "MAX(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), \
     strftime('%Y-%m-%dT%H:%M:%fZ', updated_at, '+0.001 seconds'))";

/// Fetch one request with its master's username.
pub async fn get_request(
    db: &Database,
    id: RequestId,
) -> Result<Option<Request>, RepairDeskError> {
    db.connection()
        .call(move |conn| select_request(conn, id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// List requests matching `filter`, newest first.
pub async fn list_requests(
    db: &Database,
    filter: &RequestFilter,
) -> Result<Vec<Request>, RepairDeskError> {
    let status = filter.status.map(|s| s.as_str());
    let master_id = filter.master_id;
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "{REQUEST_SELECT}
                 WHERE (?1 IS NULL OR r.status = ?1) AND (?2 IS NULL OR r.master_id = ?2)
                 ORDER BY r.created_at DESC, r.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![status, master_id], request_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a `new` request and its intake audit event.
pub async fn create_request(
    db: &Database,
    request: &NewRequest,
    audit: &AuditEntry,
) -> Result<Request, RepairDeskError> {
    let request = request.clone();
    let audit = audit.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO repair_requests (description, client_name, client_phone, address)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    request.description,
                    request.client_name,
                    request.client_phone,
                    request.address,
                ],
            )?;
            let id = tx.last_insert_rowid();
            insert_event(&tx, id, &audit)?;
            let stored = select_request(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(stored)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a status change whose precondition is re-checked inside the write
/// transaction.
///
/// The audit event records the status read inside the transaction as its
/// `old_status`, which may differ from what the caller saw earlier when the
/// write set admits several predecessors.
pub async fn update_status(
    db: &Database,
    write: &StatusWrite,
) -> Result<WriteOutcome, RepairDeskError> {
    let write = write.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let row: Option<(String, Option<UserId>)> = tx
                .query_row(
                    "SELECT status, master_id FROM repair_requests WHERE id = ?1",
                    params![write.request_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((raw, master_id)) = row else {
                return Ok(WriteOutcome::NotFound);
            };
            let current = parse_value::<RequestStatus>(0, &raw)?;
            let master_matches = match write.expected_master {
                MasterExpectation::Any => true,
                MasterExpectation::Is(id) => master_id == Some(id),
            };
            if !write.expected_statuses.contains(&current) || !master_matches {
                return Ok(WriteOutcome::PreconditionFailed { current });
            }

            tx.execute(
                &format!(
                    "UPDATE repair_requests
                     SET status = ?1,
                         master_id = COALESCE(?2, master_id),
                         updated_at = {NEXT_UPDATED_AT}
                     WHERE id = ?3"
                ),
                params![write.new_status.as_str(), write.assign_master, write.request_id],
            )?;

            let audit = AuditEntry {
                old_status: Some(current),
                ..write.audit
            };
            insert_event(&tx, write.request_id, &audit)?;
            let stored = select_request(&tx, write.request_id)?
                .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(WriteOutcome::Applied {
                request: stored,
                from: current,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim an unassigned `new` request for `master_id`.
///
/// The claim is a single compare-and-swap on `(status, master_id)`: of any
/// number of concurrent callers, at most one sees an affected row.
pub async fn try_claim(
    db: &Database,
    id: RequestId,
    master_id: UserId,
    audit: &AuditEntry,
) -> Result<ClaimOutcome, RepairDeskError> {
    let audit = audit.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                &format!(
                    "UPDATE repair_requests
                     SET status = 'in_progress',
                         master_id = ?1,
                         updated_at = {NEXT_UPDATED_AT}
                     WHERE id = ?2 AND status = 'new' AND master_id IS NULL"
                ),
                params![master_id, id],
            )?;
            if changed == 0 {
                return Ok(ClaimOutcome::Lost);
            }

            insert_event(&tx, id, &audit)?;
            let stored = select_request(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(ClaimOutcome::Claimed(stored))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn select_request(
    conn: &rusqlite::Connection,
    id: RequestId,
) -> rusqlite::Result<Option<Request>> {
    conn.query_row(
        &format!("{REQUEST_SELECT} WHERE r.id = ?1"),
        params![id],
        request_from_row,
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use repairdesk_core::{AuditAction, Role};
    use tempfile::tempdir;

    use crate::queries::{audit, users};

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn sample(name: &str) -> NewRequest {
        NewRequest {
            client_name: name.to_string(),
            client_phone: "+100".to_string(),
            description: "boiler is noisy".to_string(),
            address: None,
        }
    }

    fn entry(action: AuditAction, old: RequestStatus, new: RequestStatus) -> AuditEntry {
        AuditEntry {
            action,
            actor_id: Some(1),
            actor_username: Some("dispatcher1".to_string()),
            old_status: Some(old),
            new_status: Some(new),
        }
    }

    fn assign_write(id: RequestId, master: UserId) -> StatusWrite {
        StatusWrite {
            request_id: id,
            expected_statuses: vec![RequestStatus::New],
            expected_master: MasterExpectation::Any,
            new_status: RequestStatus::Assigned,
            assign_master: Some(master),
            audit: entry(AuditAction::Assign, RequestStatus::New, RequestStatus::Assigned),
        }
    }

    #[tokio::test]
    async fn create_writes_request_and_intake_event() {
        let (db, _dir) = setup_db().await;

        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();
        assert_eq!(created.status, RequestStatus::New);
        assert!(created.master_id.is_none());
        assert!(created.created_at.ends_with('Z'));

        let events = audit::history(&db, created.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::Create);
        assert!(events[0].old_status.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_request_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_request(&db, 999).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn assign_resolves_master_username() {
        let (db, _dir) = setup_db().await;
        let master = users::upsert_user(&db, "master1", Role::Master).await.unwrap();
        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();

        let outcome = update_status(&db, &assign_write(created.id, master))
            .await
            .unwrap();
        let WriteOutcome::Applied { request: updated, from } = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(from, RequestStatus::New);
        assert_eq!(updated.status, RequestStatus::Assigned);
        assert_eq!(updated.master_id, Some(master));
        assert_eq!(updated.master_username.as_deref(), Some("master1"));
        assert!(updated.updated_at > created.updated_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stale_precondition_writes_nothing() {
        let (db, _dir) = setup_db().await;
        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();
        update_status(&db, &assign_write(created.id, 5)).await.unwrap();

        // Second assign still expects `new`.
        let outcome = update_status(&db, &assign_write(created.id, 6))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WriteOutcome::PreconditionFailed {
                current: RequestStatus::Assigned
            }
        );

        let stored = get_request(&db, created.id).await.unwrap().unwrap();
        assert_eq!(stored.master_id, Some(5));
        assert_eq!(audit::history(&db, created.id).await.unwrap().len(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn master_expectation_is_part_of_the_precondition() {
        let (db, _dir) = setup_db().await;
        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();
        update_status(&db, &assign_write(created.id, 5)).await.unwrap();

        let start = StatusWrite {
            request_id: created.id,
            expected_statuses: vec![RequestStatus::Assigned],
            expected_master: MasterExpectation::Is(6),
            new_status: RequestStatus::InProgress,
            assign_master: None,
            audit: entry(AuditAction::Take, RequestStatus::Assigned, RequestStatus::InProgress),
        };
        let outcome = update_status(&db, &start).await.unwrap();
        assert!(matches!(outcome, WriteOutcome::PreconditionFailed { .. }));

        let start = StatusWrite {
            expected_master: MasterExpectation::Is(5),
            ..start
        };
        let outcome = update_status(&db, &start).await.unwrap();
        assert!(matches!(
            outcome,
            WriteOutcome::Applied { ref request, .. } if request.master_id == Some(5)
        ));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_accepts_any_live_predecessor_and_records_it() {
        let (db, _dir) = setup_db().await;
        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();
        // Assigned after the canceller last looked at it.
        update_status(&db, &assign_write(created.id, 5)).await.unwrap();

        let cancel = StatusWrite {
            request_id: created.id,
            expected_statuses: vec![
                RequestStatus::New,
                RequestStatus::Assigned,
                RequestStatus::InProgress,
            ],
            expected_master: MasterExpectation::Any,
            new_status: RequestStatus::Cancelled,
            assign_master: None,
            audit: entry(AuditAction::Cancel, RequestStatus::New, RequestStatus::Cancelled),
        };
        let outcome = update_status(&db, &cancel).await.unwrap();
        let WriteOutcome::Applied { request, from } = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(from, RequestStatus::Assigned);
        assert_eq!(request.status, RequestStatus::Cancelled);
        assert_eq!(request.master_id, Some(5));

        let events = audit::history(&db, created.id).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].old_status, Some(RequestStatus::Assigned));
        assert_eq!(events[2].new_status, Some(RequestStatus::Cancelled));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn updated_at_advances_on_back_to_back_writes() {
        let (db, _dir) = setup_db().await;
        let take = entry(AuditAction::Take, RequestStatus::New, RequestStatus::InProgress);
        for i in 0..50 {
            let created = create_request(&db, &sample("A"), &AuditEntry::intake())
                .await
                .unwrap();
            let assigned = match update_status(&db, &assign_write(created.id, 5)).await.unwrap() {
                WriteOutcome::Applied { request, .. } => request,
                other => panic!("expected Applied, got {other:?}"),
            };
            assert!(assigned.updated_at > created.updated_at, "assign #{i}");

            let second = create_request(&db, &sample("B"), &AuditEntry::intake())
                .await
                .unwrap();
            let ClaimOutcome::Claimed(claimed) = try_claim(&db, second.id, 7, &take).await.unwrap()
            else {
                panic!("claim #{i} should win");
            };
            assert!(claimed.updated_at > second.updated_at, "claim #{i}");
            assert!(claimed.updated_at.ends_with('Z'));
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (db, _dir) = setup_db().await;
        let outcome = update_status(&db, &assign_write(42, 5)).await.unwrap();
        assert_eq!(outcome, WriteOutcome::NotFound);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_succeeds_once() {
        let (db, _dir) = setup_db().await;
        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();
        let take = entry(AuditAction::Take, RequestStatus::New, RequestStatus::InProgress);

        let first = try_claim(&db, created.id, 7, &take).await.unwrap();
        let ClaimOutcome::Claimed(claimed) = first else {
            panic!("first claim should win");
        };
        assert_eq!(claimed.status, RequestStatus::InProgress);
        assert_eq!(claimed.master_id, Some(7));

        let second = try_claim(&db, created.id, 8, &take).await.unwrap();
        assert_eq!(second, ClaimOutcome::Lost);

        let stored = get_request(&db, created.id).await.unwrap().unwrap();
        assert_eq!(stored.master_id, Some(7));
        assert_eq!(audit::history(&db, created.id).await.unwrap().len(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_of_assigned_request_is_lost() {
        let (db, _dir) = setup_db().await;
        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();
        update_status(&db, &assign_write(created.id, 5)).await.unwrap();

        let take = entry(AuditAction::Take, RequestStatus::New, RequestStatus::InProgress);
        let outcome = try_claim(&db, created.id, 5, &take).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Lost);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_audit_append_rolls_back_status() {
        let (db, _dir) = setup_db().await;
        let created = create_request(&db, &sample("A"), &AuditEntry::intake())
            .await
            .unwrap();

        // Make every audit insert fail.
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "CREATE TRIGGER reject_audit BEFORE INSERT ON request_audit_events
                     BEGIN SELECT RAISE(ABORT, 'audit unavailable'); END;",
                )
            })
            .await
            .unwrap();

        let err = update_status(&db, &assign_write(created.id, 5))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "storage_failure");

        let take = entry(AuditAction::Take, RequestStatus::New, RequestStatus::InProgress);
        assert!(try_claim(&db, created.id, 5, &take).await.is_err());

        let stored = get_request(&db, created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::New);
        assert!(stored.master_id.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let (db, _dir) = setup_db().await;
        let a = create_request(&db, &sample("A"), &AuditEntry::intake()).await.unwrap();
        let b = create_request(&db, &sample("B"), &AuditEntry::intake()).await.unwrap();
        let c = create_request(&db, &sample("C"), &AuditEntry::intake()).await.unwrap();
        update_status(&db, &assign_write(b.id, 5)).await.unwrap();

        let all = list_requests(&db, &RequestFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);

        let fresh = list_requests(
            &db,
            &RequestFilter {
                status: Some(RequestStatus::New),
                master_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(fresh.iter().map(|r| r.id).collect::<Vec<_>>(), vec![c.id, a.id]);

        let mine = list_requests(
            &db,
            &RequestFilter {
                status: None,
                master_id: Some(5),
            },
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, b.id);

        db.close().await.unwrap();
    }
}
