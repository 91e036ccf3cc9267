// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON error envelope returned by every gateway route.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use repairdesk_core::{Capability, RepairDeskError};

/// Response body: `{code, message, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// An error with its HTTP status already decided.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.body.details = Some(details);
        self
    }

    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "request validation failed",
        )
        .with_details(json!(fields))
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required")
    }

    pub fn forbidden(required: Capability) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("the {required} capability is required"),
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
    }
}

impl From<RepairDeskError> for ApiError {
    fn from(err: RepairDeskError) -> Self {
        let code = err.code();
        match err {
            RepairDeskError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, code, err.to_string())
            }
            RepairDeskError::InvalidTransition { from, to } => {
                Self::new(StatusCode::BAD_REQUEST, code, err.to_string())
                    .with_details(json!({ "from": from, "to": to }))
            }
            RepairDeskError::RequestAlreadyTaken { .. } => {
                Self::new(StatusCode::CONFLICT, code, err.to_string())
            }
            RepairDeskError::Storage { .. } => {
                tracing::error!(error = %err, "storage failure while serving request");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, "storage failure")
            }
            RepairDeskError::Config(_) | RepairDeskError::Internal(_) => {
                tracing::error!(error = %err, "internal failure while serving request");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, "internal error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(vec![FieldError::new("id", rejection.body_text())])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(vec![FieldError::new("query", rejection.body_text())])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repairdesk_core::RequestStatus;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (RepairDeskError::NotFound { id: 4 }, StatusCode::NOT_FOUND),
            (
                RepairDeskError::RequestAlreadyTaken { id: 4 },
                StatusCode::CONFLICT,
            ),
            (
                RepairDeskError::storage(std::io::Error::other("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RepairDeskError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let code = err.code();
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, code);
        }
    }

    #[test]
    fn invalid_transition_carries_both_statuses() {
        let api = ApiError::from(RepairDeskError::InvalidTransition {
            from: RequestStatus::Done,
            to: RequestStatus::Cancelled,
        });
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(&api.body).unwrap();
        assert_eq!(body["code"], "invalid_transition");
        assert_eq!(body["details"]["from"], "done");
        assert_eq!(body["details"]["to"], "cancelled");
    }

    #[test]
    fn storage_message_is_not_leaked() {
        let api = ApiError::from(RepairDeskError::storage(std::io::Error::other(
            "/var/lib/secret.db is locked",
        )));
        assert!(!api.body.message.contains("secret"));
        assert_eq!(api.body.code, "storage_failure");
    }

    #[test]
    fn validation_lists_each_field() {
        let api = ApiError::validation(vec![
            FieldError::new("clientName", "must not be empty"),
            FieldError::new("address", "must be at most 512 characters"),
        ]);
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = serde_json::to_value(&api.body).unwrap();
        assert_eq!(body["details"][0]["field"], "clientName");
        assert_eq!(body["details"][1]["field"], "address");
    }

    #[test]
    fn details_absent_when_unset() {
        let body = serde_json::to_value(&ApiError::unauthorized().body).unwrap();
        assert!(body.get("details").is_none());
        assert_eq!(body["code"], "unauthorized");
    }
}
