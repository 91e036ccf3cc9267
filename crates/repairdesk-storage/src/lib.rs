// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for RepairDesk.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, async access
//! via `tokio-rusqlite`, and the request, audit and users queries behind
//! [`SqliteStorage`]. State writes and their audit events always commit in
//! the same transaction.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
