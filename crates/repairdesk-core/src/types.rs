// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the RepairDesk services.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Identifier of a repair request (SQLite rowid).
pub type RequestId = i64;

/// Identifier of a user known to the identity collaborator.
pub type UserId = i64;

/// Lifecycle status of a repair request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    Assigned,
    InProgress,
    Done,
    Cancelled,
}

impl RequestStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::New,
        RequestStatus::Assigned,
        RequestStatus::InProgress,
        RequestStatus::Done,
        RequestStatus::Cancelled,
    ];

    /// The persisted / wire representation.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Role of an authenticated actor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Dispatcher,
    Master,
    Admin,
}

/// Capability gates evaluated by callers before invoking engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Assign, cancel, list and inspect history. Dispatchers and admins.
    Dispatch,
    /// Take requests in work and mark them done. Masters only.
    Work,
}

/// Identity resolved by the authentication collaborator.
///
/// The engine treats it as opaque provenance for audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl Actor {
    /// Whether this actor's role grants the capability.
    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Dispatch => matches!(self.role, Role::Dispatcher | Role::Admin),
            Capability::Work => self.role == Role::Master,
        }
    }
}

/// Kind of audited operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Assign,
    Take,
    Done,
    Cancel,
}

/// A stored repair request.
///
/// `master_username` is not part of the record itself; it is resolved from
/// the users directory when the record is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: RequestId,
    pub description: String,
    pub status: RequestStatus,
    pub client_name: String,
    pub client_phone: String,
    pub address: Option<String>,
    pub master_id: Option<UserId>,
    pub master_username: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted by the public intake operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub client_name: String,
    pub client_phone: String,
    pub description: String,
    pub address: Option<String>,
}

/// An immutable record of one committed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub id: i64,
    pub request_id: RequestId,
    pub action: AuditAction,
    pub actor_id: Option<UserId>,
    pub actor_username: Option<String>,
    pub old_status: Option<RequestStatus>,
    pub new_status: Option<RequestStatus>,
    pub created_at: String,
}

/// The audit event to append alongside a state write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub actor_id: Option<UserId>,
    pub actor_username: Option<String>,
    pub old_status: Option<RequestStatus>,
    pub new_status: Option<RequestStatus>,
}

impl AuditEntry {
    /// Entry for a transition performed by an authenticated actor.
    pub fn by_actor(
        action: AuditAction,
        actor: &Actor,
        old_status: RequestStatus,
        new_status: RequestStatus,
    ) -> Self {
        Self {
            action,
            actor_id: Some(actor.id),
            actor_username: Some(actor.username.clone()),
            old_status: Some(old_status),
            new_status: Some(new_status),
        }
    }

    /// Entry for public intake: no actor, no previous status.
    pub fn intake() -> Self {
        Self {
            action: AuditAction::Create,
            actor_id: None,
            actor_username: None,
            old_status: None,
            new_status: Some(RequestStatus::New),
        }
    }
}

/// Filter for request listing. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub master_id: Option<UserId>,
}

/// A user entry from the directory (id and username only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSummary {
    pub id: UserId,
    pub username: String,
}

/// Client-facing projection of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: RequestId,
    pub client_name: String,
    pub client_phone: String,
    pub problem_text: String,
    pub address: Option<String>,
    pub status: RequestStatus,
    pub assigned_to: Option<UserId>,
    pub assigned_to_username: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Request> for RequestView {
    fn from(req: Request) -> Self {
        Self {
            id: req.id,
            client_name: req.client_name,
            client_phone: req.client_phone,
            problem_text: req.description,
            address: req.address,
            status: req.status,
            assigned_to: req.master_id,
            assigned_to_username: req.master_username,
            created_at: req.created_at,
            updated_at: req.updated_at,
        }
    }
}

/// Client-facing projection of an audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventView {
    pub id: i64,
    pub action: AuditAction,
    pub actor_username: Option<String>,
    pub old_status: Option<RequestStatus>,
    pub new_status: Option<RequestStatus>,
    pub created_at: String,
}

impl From<AuditEvent> for AuditEventView {
    fn from(event: AuditEvent) -> Self {
        Self {
            id: event.id,
            action: event.action,
            actor_username: event.actor_username,
            old_status: event.old_status,
            new_status: event.new_status,
            created_at: event.created_at,
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Gateway,
}
