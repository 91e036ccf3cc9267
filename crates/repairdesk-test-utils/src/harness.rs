// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete request stack: temp SQLite database,
//! storage adapter, transition engine, seeded dispatcher and master actors,
//! and the gateway router. [`TestHarness::call`] drives the router the way
//! an HTTP client would.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use repairdesk_config::model::{GatewayConfig, StorageConfig};
use repairdesk_core::{Actor, NewRequest, RepairDeskError, Role, UserDirectory};
use repairdesk_engine::TransitionEngine;
use repairdesk_gateway::{AuthConfig, GatewayState, build_router};
use repairdesk_storage::SqliteStorage;

/// Bearer token the harness router expects.
pub const TEST_TOKEN: &str = "harness-token";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    extra_masters: usize,
    bearer_token: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            extra_masters: 0,
            bearer_token: Some(TEST_TOKEN.to_string()),
        }
    }

    /// Seed `n` masters beyond `master1` and `master2` (`master3`, ...).
    pub fn with_extra_masters(mut self, n: usize) -> Self {
        self.extra_masters = n;
        self
    }

    /// Run the router with no bearer token configured.
    pub fn without_bearer_token(mut self) -> Self {
        self.bearer_token = None;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, RepairDeskError> {
        let temp_dir = tempfile::TempDir::new().map_err(RepairDeskError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            ..StorageConfig::default()
        };
        let storage = Arc::new(SqliteStorage::open(storage_config.clone()).await?);

        let dispatcher = seed_actor(&storage, "dispatcher1", Role::Dispatcher).await?;
        let master1 = seed_actor(&storage, "master1", Role::Master).await?;
        let master2 = seed_actor(&storage, "master2", Role::Master).await?;
        let mut masters = vec![master1.clone(), master2.clone()];
        for i in 0..self.extra_masters {
            masters.push(seed_actor(&storage, &format!("master{}", i + 3), Role::Master).await?);
        }

        let gateway_config = GatewayConfig::default();
        let state = GatewayState::from_storage(
            storage.clone(),
            AuthConfig {
                bearer_token: self.bearer_token,
            },
        );

        Ok(TestHarness {
            engine: state.engine.clone(),
            router: build_router(state, &gateway_config.cors_origins),
            storage,
            storage_config,
            dispatcher,
            master1,
            master2,
            masters,
            _temp_dir: temp_dir,
        })
    }
}

async fn seed_actor(
    storage: &SqliteStorage,
    username: &str,
    role: Role,
) -> Result<Actor, RepairDeskError> {
    let id = storage.upsert_user(username, role).await?;
    Ok(Actor {
        id,
        username: username.to_string(),
        role,
    })
}

/// A complete test environment over a temp database.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Configuration the storage was opened with, for opening more handles.
    pub storage_config: StorageConfig,
    /// Engine over `storage`.
    pub engine: TransitionEngine,
    /// Gateway router over the same engine.
    pub router: Router,
    /// Seeded `dispatcher1`.
    pub dispatcher: Actor,
    /// Seeded `master1`.
    pub master1: Actor,
    /// Seeded `master2`.
    pub master2: Actor,
    /// Every seeded master, `master1` first.
    pub masters: Vec<Actor>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with the default seed.
    pub async fn new() -> Result<Self, RepairDeskError> {
        Self::builder().build().await
    }

    /// A valid intake payload for the engine.
    pub fn sample_request(client: &str) -> NewRequest {
        NewRequest {
            client_name: client.to_string(),
            client_phone: "+100000000".to_string(),
            description: "washing machine does not drain".to_string(),
            address: Some("Main st. 1".to_string()),
        }
    }

    /// Send one request through the router.
    ///
    /// Adds the bearer token, and `X-Actor-Id` when `actor` is given.
    /// Returns the status and the JSON body (`Null` when empty).
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        actor: Option<&Actor>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), RepairDeskError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {TEST_TOKEN}"));
        if let Some(actor) = actor {
            builder = builder.header("x-actor-id", actor.id.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .map_err(|e| RepairDeskError::Internal(format!("invalid test request: {e}")))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| RepairDeskError::Internal(format!("router failed: {e}")))?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| RepairDeskError::Internal(format!("unreadable body: {e}")))?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| RepairDeskError::Internal(format!("body is not JSON: {e}")))?
        };
        Ok((status, json))
    }
}
