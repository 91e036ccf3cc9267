// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request persistence trait and its write contracts.

use async_trait::async_trait;

use crate::error::RepairDeskError;
use crate::types::{
    AuditEntry, NewRequest, Request, RequestFilter, RequestId, RequestStatus, UserId,
};

/// What the stored `master_id` must be for a [`StatusWrite`] to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterExpectation {
    /// Any value, including unset.
    Any,
    /// Exactly this master.
    Is(UserId),
}

/// A status change guarded by a precondition that is re-checked inside the
/// write transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusWrite {
    pub request_id: RequestId,
    /// Statuses the record may have at commit time.
    pub expected_statuses: Vec<RequestStatus>,
    pub expected_master: MasterExpectation,
    pub new_status: RequestStatus,
    /// When set, `master_id` is overwritten with this value.
    pub assign_master: Option<UserId>,
    /// Appended in the same transaction when the write applies. Its
    /// `old_status` is replaced with the status found at commit time.
    pub audit: AuditEntry,
}

/// Result of a [`StatusWrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write and its audit event committed. Carries the post-write record
    /// and the status it was moved from.
    Applied { request: Request, from: RequestStatus },
    /// No record with that id.
    NotFound,
    /// The record no longer matched the precondition. Nothing was written.
    PreconditionFailed { current: RequestStatus },
}

/// Result of the claim primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller won. Carries the post-write record.
    Claimed(Request),
    /// The record was not `new` with an unset master. Nothing was written.
    Lost,
}

/// Persistence of request records.
///
/// Every mutating method commits its state change and the accompanying audit
/// event as one unit of work: either both are visible afterwards or neither is.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Point lookup.
    async fn get_by_id(&self, id: RequestId) -> Result<Option<Request>, RepairDeskError>;

    /// Filtered listing, newest first.
    async fn list(&self, filter: &RequestFilter) -> Result<Vec<Request>, RepairDeskError>;

    /// Insert a `new` request together with its `create` audit event.
    async fn create_public(
        &self,
        request: &NewRequest,
        audit: &AuditEntry,
    ) -> Result<Request, RepairDeskError>;

    /// Apply a guarded status change.
    async fn update_status(&self, write: &StatusWrite) -> Result<WriteOutcome, RepairDeskError>;

    /// Atomically move a `new`, unassigned request to `in_progress` owned by
    /// `master_id`. Evaluated by the store as a single conditional mutation.
    async fn try_claim(
        &self,
        id: RequestId,
        master_id: UserId,
        audit: &AuditEntry,
    ) -> Result<ClaimOutcome, RepairDeskError>;
}
