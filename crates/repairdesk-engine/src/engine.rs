// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The transition engine: every status change of a request goes through here.
//!
//! Each mutating operation reads the current record, validates the requested
//! change against the static transition table, and hands the store a write
//! whose precondition is re-evaluated inside the write transaction. The store
//! appends the audit event in that same transaction.

use std::sync::Arc;

use repairdesk_core::lifecycle::{check_transition, guarded_predecessors};
use repairdesk_core::types::{AuditEntry, RequestId, UserId};
use repairdesk_core::{
    Actor, AuditAction, AuditEventView, AuditLog, ClaimOutcome, MasterExpectation, NewRequest,
    RepairDeskError, Request, RequestFilter, RequestStatus, RequestStore, RequestView,
    StatusWrite, WriteOutcome,
};
use tracing::{debug, info, warn};

/// Lifecycle service over a request store and its audit log.
///
/// The engine is role-agnostic: capability checks happen before it is
/// called, and the actor is recorded only as provenance. It never retries.
#[derive(Clone)]
pub struct TransitionEngine {
    store: Arc<dyn RequestStore>,
    audit: Arc<dyn AuditLog>,
}

/// One guarded status change, before it is turned into a [`StatusWrite`].
struct Transition<'a> {
    current: &'a Request,
    to: RequestStatus,
    action: AuditAction,
    actor: &'a Actor,
    expected_master: MasterExpectation,
    assign_master: Option<UserId>,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn RequestStore>, audit: Arc<dyn AuditLog>) -> Self {
        Self { store, audit }
    }

    /// Public intake: store a `new` request with no master.
    pub async fn create_request(&self, input: NewRequest) -> Result<RequestView, RepairDeskError> {
        let request = self
            .store
            .create_public(&input, &AuditEntry::intake())
            .await?;
        info!(request_id = request.id, status = %request.status, "request created");
        Ok(request.into())
    }

    /// Requests matching the filter, newest first.
    pub async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<RequestView>, RepairDeskError> {
        let requests = self.store.list(filter).await?;
        debug!(
            status = ?filter.status,
            master_id = ?filter.master_id,
            count = requests.len(),
            "requests listed"
        );
        Ok(requests.into_iter().map(RequestView::from).collect())
    }

    pub async fn get_request(&self, id: RequestId) -> Result<RequestView, RepairDeskError> {
        Ok(self.load(id).await?.into())
    }

    /// Dispatcher assignment: `new` -> `assigned`, recording the master.
    pub async fn assign_request(
        &self,
        id: RequestId,
        master_id: UserId,
        actor: &Actor,
    ) -> Result<RequestView, RepairDeskError> {
        let current = self.load(id).await?;
        self.apply(Transition {
            current: &current,
            to: RequestStatus::Assigned,
            action: AuditAction::Assign,
            actor,
            expected_master: MasterExpectation::Any,
            assign_master: Some(master_id),
        })
        .await
    }

    /// A master starts work on a request.
    ///
    /// An `assigned` request can only be started by its own master. A `new`
    /// request goes through the claim. Losing the claim, or finding the
    /// request already in progress under another master, yields
    /// [`RepairDeskError::RequestAlreadyTaken`].
    pub async fn take_in_work(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> Result<RequestView, RepairDeskError> {
        let current = self.load(id).await?;
        match current.status {
            RequestStatus::Assigned if current.master_id == Some(actor.id) => {
                self.apply(Transition {
                    current: &current,
                    to: RequestStatus::InProgress,
                    action: AuditAction::Take,
                    actor,
                    expected_master: MasterExpectation::Is(actor.id),
                    assign_master: None,
                })
                .await
            }
            RequestStatus::New => self.claim(id, actor).await,
            RequestStatus::InProgress if current.master_id != Some(actor.id) => {
                Err(claim_lost(id, actor))
            }
            from => Err(RepairDeskError::InvalidTransition {
                from,
                to: RequestStatus::InProgress,
            }),
        }
    }

    /// `in_progress` -> `done`. Ownership is not checked.
    pub async fn mark_done(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> Result<RequestView, RepairDeskError> {
        let current = self.load(id).await?;
        self.apply(Transition {
            current: &current,
            to: RequestStatus::Done,
            action: AuditAction::Done,
            actor,
            expected_master: MasterExpectation::Any,
            assign_master: None,
        })
        .await
    }

    /// Cancel any request that has not reached a terminal status.
    pub async fn cancel_request(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> Result<RequestView, RepairDeskError> {
        let current = self.load(id).await?;
        self.apply(Transition {
            current: &current,
            to: RequestStatus::Cancelled,
            action: AuditAction::Cancel,
            actor,
            expected_master: MasterExpectation::Any,
            assign_master: None,
        })
        .await
    }

    /// Audit trail of a request, oldest first.
    ///
    /// Unknown ids are `NotFound`; a known request without events yields an
    /// empty list.
    pub async fn history(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> Result<Vec<AuditEventView>, RepairDeskError> {
        self.load(id).await?;
        let events = self.audit.history(id).await?;
        debug!(request_id = id, actor = %actor.username, count = events.len(), "history read");
        Ok(events.into_iter().map(AuditEventView::from).collect())
    }

    async fn load(&self, id: RequestId) -> Result<Request, RepairDeskError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(RepairDeskError::NotFound { id })
    }

    async fn claim(&self, id: RequestId, actor: &Actor) -> Result<RequestView, RepairDeskError> {
        let audit = AuditEntry::by_actor(
            AuditAction::Take,
            actor,
            RequestStatus::New,
            RequestStatus::InProgress,
        );
        match self.store.try_claim(id, actor.id, &audit).await? {
            ClaimOutcome::Claimed(request) => {
                info!(
                    request_id = id,
                    master_id = actor.id,
                    actor = %actor.username,
                    "request claimed"
                );
                Ok(request.into())
            }
            ClaimOutcome::Lost => Err(claim_lost(id, actor)),
        }
    }

    async fn apply(&self, t: Transition<'_>) -> Result<RequestView, RepairDeskError> {
        let from = t.current.status;
        let id = t.current.id;
        check_transition(from, t.to)?;

        let write = StatusWrite {
            request_id: id,
            expected_statuses: guarded_predecessors(t.to),
            expected_master: t.expected_master,
            new_status: t.to,
            assign_master: t.assign_master,
            audit: AuditEntry::by_actor(t.action, t.actor, from, t.to),
        };
        match self.store.update_status(&write).await? {
            WriteOutcome::Applied { request, from } => {
                info!(
                    request_id = id,
                    from = %from,
                    to = %t.to,
                    actor = %t.actor.username,
                    "transition committed"
                );
                Ok(request.into())
            }
            WriteOutcome::NotFound => Err(RepairDeskError::NotFound { id }),
            WriteOutcome::PreconditionFailed { current } => {
                warn!(
                    request_id = id,
                    seen = %from,
                    current = %current,
                    to = %t.to,
                    "precondition changed before commit"
                );
                Err(RepairDeskError::InvalidTransition {
                    from: current,
                    to: t.to,
                })
            }
        }
    }
}

fn claim_lost(id: RequestId, actor: &Actor) -> RepairDeskError {
    warn!(request_id = id, master_id = actor.id, "claim lost");
    RepairDeskError::RequestAlreadyTaken { id }
}
