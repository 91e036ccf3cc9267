// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Users directory: the identities masters are assigned by.

use async_trait::async_trait;

use crate::error::RepairDeskError;
use crate::types::{Actor, MasterSummary, Role, UserId};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create the user if the username is unknown; return the stored id either way.
    async fn upsert_user(&self, username: &str, role: Role) -> Result<UserId, RepairDeskError>;

    /// Look a user up by id.
    async fn get_user(&self, id: UserId) -> Result<Option<Actor>, RepairDeskError>;

    /// All users with the master role, ordered by username.
    async fn list_masters(&self) -> Result<Vec<MasterSummary>, RepairDeskError>;
}
