// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read side of the append-only audit trail.

use async_trait::async_trait;

use crate::error::RepairDeskError;
use crate::types::{AuditEvent, RequestId};

/// Read access to the audit trail.
///
/// Events are only appended by [`RequestStore`](super::RequestStore) writes,
/// in the same transaction as the state change they document.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Events for a request, oldest first. Empty when none exist.
    async fn history(&self, request_id: RequestId) -> Result<Vec<AuditEvent>, RepairDeskError>;
}
