// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication and actor resolution for the gateway.
//!
//! Two layers guard every non-public route:
//! 1. Bearer token (`Authorization: Bearer <token>`), checked by middleware.
//! 2. Actor identity (`X-Actor-Id`), resolved against the users directory
//!    by the [`CurrentActor`] extractor.
//!
//! When no bearer token is configured, all requests are rejected (fail-closed).

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};

use repairdesk_core::{Actor, Capability, RepairDeskError, UserDirectory};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Header carrying the numeric user id of the calling actor.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. If `None`, every protected request is rejected.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that validates the bearer token.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected_token) = auth.bearer_token.as_deref() else {
        tracing::error!("gateway has no bearer token configured -- rejecting request");
        return Err(ApiError::unauthorized());
    };

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected_token => Ok(next.run(request).await),
        _ => Err(ApiError::unauthorized()),
    }
}

/// Turns request credentials into an [`Actor`], or `None` when there is no
/// valid actor.
#[async_trait]
pub trait ActorResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Actor>, RepairDeskError>;
}

/// Resolves `X-Actor-Id` by looking the user up in the directory, so the
/// username and role always come from the store.
pub struct DirectoryActorResolver {
    directory: Arc<dyn UserDirectory>,
}

impl DirectoryActorResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl ActorResolver for DirectoryActorResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Actor>, RepairDeskError> {
        let Some(id) = headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
        else {
            return Ok(None);
        };
        let actor = self.directory.get_user(id).await?;
        if actor.is_none() {
            tracing::debug!(actor_id = id, "actor id does not resolve to a user");
        }
        Ok(actor)
    }
}

/// The resolved caller of an authenticated route.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl CurrentActor {
    /// Unwrap the actor if it holds `capability`, else 403.
    pub fn require(self, capability: Capability) -> Result<Actor, ApiError> {
        if self.0.has_capability(capability) {
            Ok(self.0)
        } else {
            tracing::debug!(
                actor = %self.0.username,
                role = %self.0.role,
                %capability,
                "capability check failed"
            );
            Err(ApiError::forbidden(capability))
        }
    }
}

impl FromRequestParts<GatewayState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        match state.actors.resolve(&parts.headers).await? {
            Some(actor) => Ok(CurrentActor(actor)),
            None => Err(ApiError::unauthorized()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use repairdesk_core::{MasterSummary, Role, UserId};

    struct OneUser(Actor);

    #[async_trait]
    impl UserDirectory for OneUser {
        async fn upsert_user(&self, _: &str, _: Role) -> Result<UserId, RepairDeskError> {
            Ok(self.0.id)
        }

        async fn get_user(&self, id: UserId) -> Result<Option<Actor>, RepairDeskError> {
            Ok((id == self.0.id).then(|| self.0.clone()))
        }

        async fn list_masters(&self) -> Result<Vec<MasterSummary>, RepairDeskError> {
            Ok(vec![])
        }
    }

    fn resolver() -> DirectoryActorResolver {
        DirectoryActorResolver::new(Arc::new(OneUser(Actor {
            id: 7,
            username: "dispatcher1".into(),
            role: Role::Dispatcher,
        })))
    }

    fn headers_with(actor_id: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static(actor_id));
        headers
    }

    #[test]
    fn auth_config_debug_redacts_token() {
        let config = AuthConfig {
            bearer_token: Some("secret-token".to_string()),
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
    }

    #[tokio::test]
    async fn known_actor_resolves_from_directory() {
        let actor = resolver().resolve(&headers_with("7")).await.unwrap().unwrap();
        assert_eq!(actor.username, "dispatcher1");
        assert_eq!(actor.role, Role::Dispatcher);
    }

    #[tokio::test]
    async fn missing_malformed_or_unknown_actor_is_none() {
        let resolver = resolver();
        assert!(resolver.resolve(&HeaderMap::new()).await.unwrap().is_none());
        assert!(resolver.resolve(&headers_with("seven")).await.unwrap().is_none());
        assert!(resolver.resolve(&headers_with("8")).await.unwrap().is_none());
    }

    #[test]
    fn require_checks_capability() {
        let master = CurrentActor(Actor {
            id: 2,
            username: "master1".into(),
            role: Role::Master,
        });
        assert!(master.clone().require(Capability::Work).is_ok());
        let err = master.require(Capability::Dispatch).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }
}
