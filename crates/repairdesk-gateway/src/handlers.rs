// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Each handler validates its input, checks the caller's capability, and
//! delegates to the [`TransitionEngine`](repairdesk_engine::TransitionEngine).

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use repairdesk_core::{
    AuditEventView, Capability, HealthStatus, MasterSummary, NewRequest, RequestFilter, RequestId,
    RequestStatus, RequestView, UserId,
};

use crate::auth::CurrentActor;
use crate::error::{ApiError, FieldError};
use crate::server::GatewayState;

const CLIENT_NAME_MAX: usize = 255;
const CLIENT_PHONE_MAX: usize = 64;
const ADDRESS_MAX: usize = 512;

/// Request body for `POST /requests`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub client_name: String,
    pub client_phone: String,
    pub problem_text: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl CreateRequestBody {
    /// Check every field and collect all failures, not only the first.
    pub fn validate(self) -> Result<NewRequest, ApiError> {
        let mut errors = Vec::new();
        check_length(&mut errors, "clientName", &self.client_name, 1, CLIENT_NAME_MAX);
        check_length(&mut errors, "clientPhone", &self.client_phone, 1, CLIENT_PHONE_MAX);
        check_length(&mut errors, "problemText", &self.problem_text, 1, usize::MAX);

        let address = self.address.filter(|a| !a.trim().is_empty());
        if let Some(address) = &address {
            check_length(&mut errors, "address", address, 0, ADDRESS_MAX);
        }

        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }
        Ok(NewRequest {
            client_name: self.client_name,
            client_phone: self.client_phone,
            description: self.problem_text,
            address,
        })
    }
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(FieldError::new(field, "must not be empty"));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

/// Request body for `PATCH /requests/{id}/assign`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    pub master_id: UserId,
}

/// Query string for `GET /requests`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub master_id: Option<UserId>,
}

impl ListQuery {
    fn into_filter(self) -> Result<RequestFilter, ApiError> {
        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<RequestStatus>().map_err(|_| {
                ApiError::validation(vec![FieldError::new(
                    "status",
                    format!("unknown status '{raw}'"),
                )])
            })?),
        };
        Ok(RequestFilter {
            status,
            master_id: self.master_id,
        })
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
///
/// Public. 503 when the storage backend reports itself unhealthy.
pub async fn health(State(state): State<GatewayState>) -> Response {
    match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => Json(HealthResponse { status: "ok" }).into_response(),
        Ok(HealthStatus::Degraded(reason)) => {
            tracing::warn!(%reason, "storage degraded");
            Json(HealthResponse { status: "degraded" }).into_response()
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            tracing::warn!(%reason, "storage unhealthy");
            ApiError::unavailable("storage unhealthy").into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "storage health check failed");
            ApiError::unavailable("storage unhealthy").into_response()
        }
    }
}

/// POST /requests
///
/// Public intake; no actor is required.
pub async fn create_request(
    State(state): State<GatewayState>,
    body: Result<Json<CreateRequestBody>, JsonRejection>,
) -> Result<Json<RequestView>, ApiError> {
    let Json(body) = body?;
    let input = body.validate()?;
    Ok(Json(state.engine.create_request(input).await?))
}

/// GET /requests?status=&masterId=
pub async fn list_requests(
    State(state): State<GatewayState>,
    actor: CurrentActor,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<RequestView>>, ApiError> {
    actor.require(Capability::Dispatch)?;
    let Query(query) = query?;
    let filter = query.into_filter()?;
    Ok(Json(state.engine.list_requests(&filter).await?))
}

/// GET /requests/{id}
pub async fn get_request(
    State(state): State<GatewayState>,
    actor: CurrentActor,
    id: Result<Path<RequestId>, PathRejection>,
) -> Result<Json<RequestView>, ApiError> {
    actor.require(Capability::Dispatch)?;
    let Path(id) = id?;
    Ok(Json(state.engine.get_request(id).await?))
}

/// PATCH /requests/{id}/assign
pub async fn assign_request(
    State(state): State<GatewayState>,
    actor: CurrentActor,
    id: Result<Path<RequestId>, PathRejection>,
    body: Result<Json<AssignBody>, JsonRejection>,
) -> Result<Json<RequestView>, ApiError> {
    let actor = actor.require(Capability::Dispatch)?;
    let Path(id) = id?;
    let Json(body) = body?;
    Ok(Json(
        state
            .engine
            .assign_request(id, body.master_id, &actor)
            .await?,
    ))
}

/// PATCH /requests/{id}/cancel
pub async fn cancel_request(
    State(state): State<GatewayState>,
    actor: CurrentActor,
    id: Result<Path<RequestId>, PathRejection>,
) -> Result<Json<RequestView>, ApiError> {
    let actor = actor.require(Capability::Dispatch)?;
    let Path(id) = id?;
    Ok(Json(state.engine.cancel_request(id, &actor).await?))
}

/// GET /requests/{id}/history
///
/// Oldest event first.
pub async fn get_history(
    State(state): State<GatewayState>,
    actor: CurrentActor,
    id: Result<Path<RequestId>, PathRejection>,
) -> Result<Json<Vec<AuditEventView>>, ApiError> {
    let actor = actor.require(Capability::Dispatch)?;
    let Path(id) = id?;
    Ok(Json(state.engine.history(id, &actor).await?))
}

/// GET /master/requests
///
/// The calling master's own work queue.
pub async fn list_master_requests(
    State(state): State<GatewayState>,
    actor: CurrentActor,
) -> Result<Json<Vec<RequestView>>, ApiError> {
    let actor = actor.require(Capability::Work)?;
    let filter = RequestFilter {
        status: None,
        master_id: Some(actor.id),
    };
    Ok(Json(state.engine.list_requests(&filter).await?))
}

/// PATCH /requests/{id}/take
///
/// 409 `request_already_taken` when another master got there first.
pub async fn take_in_work(
    State(state): State<GatewayState>,
    actor: CurrentActor,
    id: Result<Path<RequestId>, PathRejection>,
) -> Result<Json<RequestView>, ApiError> {
    let actor = actor.require(Capability::Work)?;
    let Path(id) = id?;
    Ok(Json(state.engine.take_in_work(id, &actor).await?))
}

/// PATCH /requests/{id}/done
pub async fn mark_done(
    State(state): State<GatewayState>,
    actor: CurrentActor,
    id: Result<Path<RequestId>, PathRejection>,
) -> Result<Json<RequestView>, ApiError> {
    let actor = actor.require(Capability::Work)?;
    let Path(id) = id?;
    Ok(Json(state.engine.mark_done(id, &actor).await?))
}

/// GET /users/masters
pub async fn list_masters(
    State(state): State<GatewayState>,
    actor: CurrentActor,
) -> Result<Json<Vec<MasterSummary>>, ApiError> {
    actor.require(Capability::Dispatch)?;
    Ok(Json(state.directory.list_masters().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn body(name: &str, phone: &str, text: &str, address: Option<&str>) -> CreateRequestBody {
        CreateRequestBody {
            client_name: name.into(),
            client_phone: phone.into(),
            problem_text: text.into(),
            address: address.map(Into::into),
        }
    }

    fn failed_fields(err: ApiError) -> Vec<String> {
        let json = serde_json::to_value(&err.body).unwrap();
        json["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn create_body_uses_camel_case_fields() {
        let json = r#"{"clientName":"A","clientPhone":"1","problemText":"leak"}"#;
        let parsed: CreateRequestBody = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.problem_text, "leak");
        assert!(parsed.address.is_none());
    }

    #[test]
    fn valid_body_becomes_new_request() {
        let input = body("A", "1", "leak", Some("Main st. 1")).validate().unwrap();
        assert_eq!(input.description, "leak");
        assert_eq!(input.address.as_deref(), Some("Main st. 1"));
    }

    #[test]
    fn blank_address_is_absent() {
        let input = body("A", "1", "leak", Some("   ")).validate().unwrap();
        assert!(input.address.is_none());
    }

    #[test]
    fn all_failing_fields_are_reported() {
        let long_phone = "9".repeat(CLIENT_PHONE_MAX + 1);
        let long_address = "x".repeat(ADDRESS_MAX + 1);
        let err = body("", &long_phone, "", Some(&long_address))
            .validate()
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            failed_fields(err),
            vec!["clientName", "clientPhone", "problemText", "address"]
        );
    }

    #[test]
    fn length_limits_count_characters() {
        let name = "Ж".repeat(CLIENT_NAME_MAX);
        assert!(body(&name, "1", "leak", None).validate().is_ok());
        let name = "Ж".repeat(CLIENT_NAME_MAX + 1);
        assert_eq!(
            failed_fields(body(&name, "1", "leak", None).validate().unwrap_err()),
            vec!["clientName"]
        );
    }

    #[test]
    fn list_query_parses_status() {
        let query = ListQuery {
            status: Some("in_progress".into()),
            master_id: Some(3),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(RequestStatus::InProgress));
        assert_eq!(filter.master_id, Some(3));
    }

    #[test]
    fn list_query_rejects_unknown_status() {
        let query = ListQuery {
            status: Some("archived".into()),
            master_id: None,
        };
        assert_eq!(failed_fields(query.into_filter().unwrap_err()), vec!["status"]);
    }
}
