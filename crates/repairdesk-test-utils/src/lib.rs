// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for RepairDesk integration tests.
//!
//! Provides a harness that assembles the full request stack over a
//! throwaway SQLite database, for fast, deterministic tests without
//! external services.
//!
//! # Components
//!
//! - [`TestHarness`] - temp storage, engine, seeded actors and the HTTP router

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder};
