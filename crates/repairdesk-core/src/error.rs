// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the RepairDesk request lifecycle.

use thiserror::Error;

use crate::types::{RequestId, RequestStatus};

/// The primary error type used across RepairDesk adapter traits and the engine.
///
/// `NotFound`, `InvalidTransition` and `RequestAlreadyTaken` are final for the
/// call that produced them. Nothing in the workspace retries them.
#[derive(Debug, Error)]
pub enum RepairDeskError {
    /// The request id does not resolve to a stored record.
    #[error("request {id} not found")]
    NotFound { id: RequestId },

    /// The requested status change is not in the transition table for the
    /// current status.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    /// Another master won the claim race for an unassigned request.
    #[error("request {id} is already taken")]
    RequestAlreadyTaken { id: RequestId },

    /// Storage backend errors (connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RepairDeskError {
    /// Stable machine-readable code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::RequestAlreadyTaken { .. } => "request_already_taken",
            Self::Storage { .. } => "storage_failure",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Wrap any error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_for_domain_failures() {
        let not_found = RepairDeskError::NotFound { id: 1 };
        let invalid = RepairDeskError::InvalidTransition {
            from: RequestStatus::Done,
            to: RequestStatus::Cancelled,
        };
        let taken = RepairDeskError::RequestAlreadyTaken { id: 1 };

        assert_eq!(not_found.code(), "not_found");
        assert_eq!(invalid.code(), "invalid_transition");
        assert_eq!(taken.code(), "request_already_taken");
    }

    #[test]
    fn invalid_transition_message_names_both_statuses() {
        let err = RepairDeskError::InvalidTransition {
            from: RequestStatus::InProgress,
            to: RequestStatus::Assigned,
        };
        assert_eq!(
            err.to_string(),
            "invalid transition from in_progress to assigned"
        );
    }

    #[test]
    fn storage_helper_boxes_source() {
        let err = RepairDeskError::storage(std::io::Error::other("disk gone"));
        assert_eq!(err.code(), "storage_failure");
        assert!(err.to_string().contains("disk gone"));
    }
}
