// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `repairdesk seed` command implementation.
//!
//! Creates development users and, unless they already exist, three sample
//! requests: one `new`, one `assigned` to `master1`, one `in_progress` under
//! `master2`. The samples go through the engine so their audit trails match
//! what the HTTP surface would have produced.

use std::sync::Arc;

use repairdesk_config::model::RepairDeskConfig;
use repairdesk_core::{
    Actor, NewRequest, PluginAdapter, RepairDeskError, RequestFilter, Role, UserDirectory,
};
use repairdesk_engine::TransitionEngine;
use repairdesk_storage::SqliteStorage;
use tracing::info;

const DEV_USERS: [(&str, Role); 3] = [
    ("dispatcher1", Role::Dispatcher),
    ("master1", Role::Master),
    ("master2", Role::Master),
];

/// (client name, phone, problem, address). The phone numbers mark a
/// request as a sample.
const SAMPLE_REQUESTS: [(&str, &str, &str, &str); 3] = [
    ("Ivan Ivanov", "+1 555 0101", "Kitchen socket has no power", "1 Lenin st."),
    ("Maria Petrova", "+1 555 0102", "Bathroom tap is leaking", "15 Peace ave."),
    ("Peter Sidorov", "+1 555 0103", "Hallway light will not switch on", "7 Gagarin st."),
];

/// What a seed run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub requests_created: usize,
}

/// Runs the `repairdesk seed` command.
pub async fn run_seed(config: RepairDeskConfig) -> Result<(), RepairDeskError> {
    crate::init_tracing(&config.service.log_level);

    let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);
    let report = seed(storage.clone()).await?;
    storage.shutdown().await?;

    println!(
        "repairdesk: seeded {} users, {} sample requests",
        report.users, report.requests_created
    );
    Ok(())
}

/// Upsert the dev users and create the sample requests if missing.
pub async fn seed(storage: Arc<SqliteStorage>) -> Result<SeedReport, RepairDeskError> {
    let mut actors = Vec::with_capacity(DEV_USERS.len());
    for (username, role) in DEV_USERS {
        let id = storage.upsert_user(username, role).await?;
        actors.push(Actor {
            id,
            username: username.to_string(),
            role,
        });
    }
    let (dispatcher, master1, master2) = (&actors[0], &actors[1], &actors[2]);

    let engine = TransitionEngine::new(storage.clone(), storage.clone());
    let existing = engine.list_requests(&RequestFilter::default()).await?;
    let already_seeded = existing
        .iter()
        .any(|r| SAMPLE_REQUESTS.iter().any(|(_, phone, _, _)| r.client_phone == *phone));
    if already_seeded {
        info!("sample requests already present, skipping");
        return Ok(SeedReport {
            users: actors.len(),
            requests_created: 0,
        });
    }

    let mut ids = Vec::with_capacity(SAMPLE_REQUESTS.len());
    for (name, phone, problem, address) in SAMPLE_REQUESTS {
        let created = engine
            .create_request(NewRequest {
                client_name: name.to_string(),
                client_phone: phone.to_string(),
                description: problem.to_string(),
                address: Some(address.to_string()),
            })
            .await?;
        ids.push(created.id);
    }

    engine.assign_request(ids[1], master1.id, dispatcher).await?;
    engine.take_in_work(ids[2], master2).await?;

    info!(count = ids.len(), "sample requests created");
    Ok(SeedReport {
        users: actors.len(),
        requests_created: ids.len(),
    })
}
