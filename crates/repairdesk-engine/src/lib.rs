// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request lifecycle service for RepairDesk.
//!
//! [`TransitionEngine`] validates status changes against the transition
//! table in `repairdesk-core` and commits them, together with their audit
//! events, through a [`RequestStore`](repairdesk_core::RequestStore).

pub mod engine;

pub use engine::TransitionEngine;
