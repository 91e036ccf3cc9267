// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use repairdesk_config::model::GatewayConfig;
use repairdesk_core::{AuditLog, PluginAdapter, RepairDeskError, RequestStore, UserDirectory};
use repairdesk_engine::TransitionEngine;

use crate::auth::{
    ACTOR_HEADER, ActorResolver, AuthConfig, DirectoryActorResolver, auth_middleware,
};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Lifecycle service every request operation goes through.
    pub engine: TransitionEngine,
    /// Users directory, for the masters listing.
    pub directory: Arc<dyn UserDirectory>,
    /// Resolves the calling actor of authenticated routes.
    pub actors: Arc<dyn ActorResolver>,
    /// Storage adapter probed by `GET /health`.
    pub storage: Arc<dyn PluginAdapter>,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

impl GatewayState {
    /// Wire the engine, directory and actor resolver to one storage backend.
    pub fn from_storage<S>(storage: Arc<S>, auth: AuthConfig) -> Self
    where
        S: RequestStore + AuditLog + UserDirectory + PluginAdapter,
    {
        let engine = TransitionEngine::new(storage.clone(), storage.clone());
        let directory: Arc<dyn UserDirectory> = storage.clone();
        Self {
            engine,
            actors: Arc::new(DirectoryActorResolver::new(directory.clone())),
            directory,
            storage,
            auth,
        }
    }
}

/// Build the full router.
///
/// `GET /health` and `POST /requests` are public; everything else sits
/// behind the bearer-token middleware and resolves its actor per request.
pub fn build_router(state: GatewayState, cors_origins: &[String]) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/requests", post(handlers::create_request));

    let api_routes = Router::new()
        .route("/requests", get(handlers::list_requests))
        .route("/requests/{id}", get(handlers::get_request))
        .route("/requests/{id}/assign", patch(handlers::assign_request))
        .route("/requests/{id}/cancel", patch(handlers::cancel_request))
        .route("/requests/{id}/history", get(handlers::get_history))
        .route("/requests/{id}/take", patch(handlers::take_in_work))
        .route("/requests/{id}/done", patch(handlers::mark_done))
        .route("/master/requests", get(handlers::list_master_requests))
        .route("/users/masters", get(handlers::list_masters))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(ACTOR_HEADER),
        ])
}

/// Bind to the configured host:port and serve `app` until `shutdown` resolves.
pub async fn start_server<F>(
    config: &GatewayConfig,
    app: Router,
    shutdown: F,
) -> Result<(), RepairDeskError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        RepairDeskError::Internal(format!("failed to bind gateway to {addr}: {e}"))
    })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RepairDeskError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_layer_skips_bad_origins() {
        // Must not panic on a header value with a newline in it.
        let _layer = cors_layer(&[
            "http://localhost:3000".to_string(),
            "http://bad\norigin".to_string(),
        ]);
    }
}
