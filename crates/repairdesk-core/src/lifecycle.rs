// SPDX-FileCopyrightText: 2026 RepairDesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request lifecycle transition table.
//!
//! ```text
//! new ──assign──▶ assigned ──take──▶ in_progress ──done──▶ done
//!  │                 │                   │
//!  ├──claim──────────┼──────────────────▶│
//!  └──cancel─────────┴──cancel───────────┴──cancel──▶ cancelled
//! ```
//!
//! `new -> in_progress` is only reachable through the claim protocol.
//! `done` and `cancelled` are terminal.

use crate::error::RepairDeskError;
use crate::types::RequestStatus;

/// Statuses reachable in one step from `from`.
pub const fn allowed_successors(from: RequestStatus) -> &'static [RequestStatus] {
    match from {
        RequestStatus::New => &[
            RequestStatus::Assigned,
            RequestStatus::InProgress,
            RequestStatus::Cancelled,
        ],
        RequestStatus::Assigned => &[RequestStatus::InProgress, RequestStatus::Cancelled],
        RequestStatus::InProgress => &[RequestStatus::Done, RequestStatus::Cancelled],
        RequestStatus::Done | RequestStatus::Cancelled => &[],
    }
}

/// Whether `from -> to` appears in the table.
pub fn is_allowed(from: RequestStatus, to: RequestStatus) -> bool {
    allowed_successors(from).contains(&to)
}

/// Whether `status` has no outgoing transitions.
pub fn is_terminal(status: RequestStatus) -> bool {
    allowed_successors(status).is_empty()
}

/// Statuses a guarded write may move to `to` from.
///
/// `new -> in_progress` is left out: it belongs to the claim.
pub fn guarded_predecessors(to: RequestStatus) -> Vec<RequestStatus> {
    RequestStatus::ALL
        .into_iter()
        .filter(|&from| is_allowed(from, to))
        .filter(|&from| !(from == RequestStatus::New && to == RequestStatus::InProgress))
        .collect()
}

/// Reject `from -> to` unless the table permits it.
pub fn check_transition(from: RequestStatus, to: RequestStatus) -> Result<(), RepairDeskError> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(RepairDeskError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal(RequestStatus::Done));
        assert!(is_terminal(RequestStatus::Cancelled));
        assert!(!is_terminal(RequestStatus::New));
        assert!(!is_terminal(RequestStatus::Assigned));
        assert!(!is_terminal(RequestStatus::InProgress));
    }

    #[test]
    fn guarded_predecessors_exclude_the_claim_edge() {
        use RequestStatus::*;
        assert_eq!(guarded_predecessors(Cancelled), vec![New, Assigned, InProgress]);
        assert_eq!(guarded_predecessors(InProgress), vec![Assigned]);
        assert_eq!(guarded_predecessors(Assigned), vec![New]);
        assert_eq!(guarded_predecessors(Done), vec![InProgress]);
        assert!(guarded_predecessors(New).is_empty());
    }

    #[test]
    fn reassignment_is_not_allowed() {
        assert!(!is_allowed(RequestStatus::Assigned, RequestStatus::Assigned));
    }

    #[test]
    fn no_backward_edges() {
        assert!(!is_allowed(RequestStatus::InProgress, RequestStatus::Assigned));
        assert!(!is_allowed(RequestStatus::InProgress, RequestStatus::New));
        assert!(!is_allowed(RequestStatus::Assigned, RequestStatus::New));
    }

    #[test]
    fn check_transition_reports_pair() {
        let err = check_transition(RequestStatus::Done, RequestStatus::Cancelled).unwrap_err();
        match err {
            RepairDeskError::InvalidTransition { from, to } => {
                assert_eq!(from, RequestStatus::Done);
                assert_eq!(to, RequestStatus::Cancelled);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn any_status() -> impl Strategy<Value = RequestStatus> {
        prop::sample::select(RequestStatus::ALL.to_vec())
    }

    fn rank(status: RequestStatus) -> u8 {
        match status {
            RequestStatus::New => 0,
            RequestStatus::Assigned => 1,
            RequestStatus::InProgress => 2,
            RequestStatus::Done | RequestStatus::Cancelled => 3,
        }
    }

    proptest! {
        #[test]
        fn allowed_edges_only_move_forward(from in any_status(), to in any_status()) {
            if is_allowed(from, to) {
                prop_assert!(rank(to) > rank(from));
            }
        }

        #[test]
        fn check_agrees_with_table(from in any_status(), to in any_status()) {
            prop_assert_eq!(check_transition(from, to).is_ok(), is_allowed(from, to));
        }

        #[test]
        fn nothing_leaves_a_terminal_status(from in any_status(), to in any_status()) {
            if is_terminal(from) {
                prop_assert!(!is_allowed(from, to));
            }
        }
    }
}
