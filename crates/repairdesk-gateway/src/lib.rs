// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the repair-request lifecycle.
//!
//! Exposes the request operations as a REST API in front of the
//! [`TransitionEngine`](repairdesk_engine::TransitionEngine). The gateway
//! owns transport concerns only: the bearer-token gate, actor resolution,
//! role capability checks, input validation and the JSON error envelope.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use repairdesk_config::model::GatewayConfig;
use repairdesk_core::{AdapterType, HealthStatus, PluginAdapter, RepairDeskError};

pub use crate::auth::{ActorResolver, AuthConfig, CurrentActor, DirectoryActorResolver};
pub use crate::error::ApiError;
pub use crate::server::{GatewayState, build_router};

/// The gateway as a managed adapter.
///
/// Runs the axum server as a background task started by
/// [`GatewayServer::start`] and stopped gracefully by
/// [`PluginAdapter::shutdown`].
pub struct GatewayServer {
    config: GatewayConfig,
    state: GatewayState,
    /// Cancelled to ask the server to drain and stop.
    stop: CancellationToken,
    /// Cancelled by the server task when it exits, for whatever reason.
    stopped: CancellationToken,
    server_handle: Mutex<Option<tokio::task::JoinHandle<Result<(), RepairDeskError>>>>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, state: GatewayState) -> Self {
        Self {
            config,
            state,
            stop: CancellationToken::new(),
            stopped: CancellationToken::new(),
            server_handle: Mutex::new(None),
        }
    }

    /// Spawn the HTTP server. Calling it twice is an error.
    pub async fn start(&self) -> Result<(), RepairDeskError> {
        let mut handle = self.server_handle.lock().await;
        if handle.is_some() {
            return Err(RepairDeskError::Internal(
                "gateway server already started".to_string(),
            ));
        }

        let app = build_router(self.state.clone(), &self.config.cors_origins);
        let config = self.config.clone();
        let stop = self.stop.clone();
        let stopped = self.stopped.clone();
        *handle = Some(tokio::spawn(async move {
            let result = server::start_server(&config, app, stop.cancelled_owned()).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "gateway server failed");
            }
            stopped.cancel();
            result
        }));

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            "gateway started"
        );
        Ok(())
    }

    /// Resolves once the server task has exited.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await;
    }
}

impl std::fmt::Debug for GatewayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayServer")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("auth", &self.state.auth)
            .finish()
    }
}

#[async_trait]
impl PluginAdapter for GatewayServer {
    fn name(&self) -> &str {
        "gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, RepairDeskError> {
        let handle = self.server_handle.lock().await;
        match handle.as_ref() {
            None => Ok(HealthStatus::Unhealthy("server not started".to_string())),
            Some(_) if self.stopped.is_cancelled() => {
                Ok(HealthStatus::Unhealthy("server task exited".to_string()))
            }
            Some(_) => Ok(HealthStatus::Healthy),
        }
    }

    /// Stop accepting connections, drain in-flight requests, and return the
    /// server task's result.
    async fn shutdown(&self) -> Result<(), RepairDeskError> {
        self.stop.cancel();
        let handle = self.server_handle.lock().await.take();
        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| RepairDeskError::Internal(format!("gateway task panicked: {e}")))?,
            None => Ok(()),
        }
    }
}
