// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `repairdesk serve` command implementation.
//!
//! Opens SQLite storage, wires the transition engine and the HTTP gateway
//! over it, and serves until SIGINT/SIGTERM. On shutdown the gateway drains
//! in-flight requests before storage checkpoints its WAL.

use std::sync::Arc;

use repairdesk_config::model::RepairDeskConfig;
use repairdesk_core::{PluginAdapter, RepairDeskError};
use repairdesk_gateway::{AuthConfig, GatewayServer, GatewayState};
use repairdesk_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `repairdesk serve` command.
pub async fn run_serve(config: RepairDeskConfig) -> Result<(), RepairDeskError> {
    crate::init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting repairdesk serve");

    let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);
    info!(path = %config.storage.database_path, "storage ready");

    if config.gateway.bearer_token.is_none() {
        warn!("gateway.bearer_token is not set -- every authenticated route will reject requests");
    }

    let state = GatewayState::from_storage(
        storage.clone(),
        AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
    );
    let gateway = GatewayServer::new(config.gateway.clone(), state);
    gateway.start().await?;

    let cancel = shutdown::install_signal_handler();
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = gateway.stopped() => {
            warn!("gateway stopped before a shutdown signal");
        }
    }

    let served = gateway.shutdown().await;
    storage.shutdown().await?;
    served?;

    info!("repairdesk serve shutdown complete");
    Ok(())
}
