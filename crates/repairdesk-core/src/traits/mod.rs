// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Persistence is split along the same seams as the domain: request records,
//! the audit trail, and the users directory. A single backend usually
//! implements all three.

pub mod adapter;
pub mod audit;
pub mod directory;
pub mod store;

pub use adapter::PluginAdapter;
pub use audit::AuditLog;
pub use directory::UserDirectory;
pub use store::{ClaimOutcome, MasterExpectation, RequestStore, StatusWrite, WriteOutcome};
