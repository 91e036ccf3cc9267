// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for RepairDesk.
//!
//! This crate provides the request lifecycle model shared by every other
//! crate in the workspace: domain and view types, the static transition
//! table, the error type, and the persistence traits that storage backends
//! implement.

pub mod error;
pub mod lifecycle;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RepairDeskError;
pub use types::{
    Actor, AdapterType, AuditAction, AuditEntry, AuditEvent, AuditEventView, Capability,
    HealthStatus, MasterSummary, NewRequest, Request, RequestFilter, RequestId, RequestStatus,
    RequestView, Role, UserId,
};

pub use traits::{
    AuditLog, ClaimOutcome, MasterExpectation, PluginAdapter, RequestStore, StatusWrite,
    UserDirectory, WriteOutcome,
};
