// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent status state machine (transition table only; no I/O).
//!
//! Two entry points mirror the two ways a status can change:
//! [`next_for_event`] is used by the router, which silently no-ops on any
//! edge the table forbids (a disallowed router-driven transition is logged
//! and ignored, never surfaced as an error); [`apply_explicit`] is used by
//! the `PATCH /agents/{id}/status` handler, which must reject a disallowed
//! edge with `InvalidTransition`.

use crate::error::AppError;
use crate::event::EventKind;
use crate::model::AgentStatus;

/// Canonical-kind-driven transitions do not have a dedicated "handoff
/// initiated" / "handoff acknowledged" event in the wire vocabulary (see
/// DESIGN.md). `SubagentStopped` is treated as the handoff-initiated
/// trigger (a subagent finishing hands control back to its parent); any
/// subsequent tool-use or session-start event is treated as handoff
/// acknowledgement, matching the table's "new tool_use" trigger.
pub fn next_for_event(current: AgentStatus, kind: EventKind) -> AgentStatus {
    use AgentStatus::*;
    use EventKind::*;

    if current == Complete {
        // Complete is terminal for lifecycle logic; late events are logged
        // by the caller but never move status off Complete.
        return Complete;
    }

    match (current, kind) {
        (_, AgentStarted | ConversationStart) => Active,
        (Idle | Handoff | Error | Active, ToolPre | ToolPost) => Active,
        (Active, SubagentStopped) => Handoff,
        (Active, AgentStopped | ConversationEnd) => Complete,
        (Active, AgentErrored) => Error,
        (same, ContextUpdated | TaskStarted | TaskCompleted | Notification | Generic) => same,
        (same, _) => same,
    }
}

/// Validate and apply an explicit status-change request (`PATCH
/// /agents/{id}/status`).
///
/// Unlike [`next_for_event`] (restricted to the router's event-driven edges),
/// the explicit endpoint is an administrative override: any status reachable
/// from a non-terminal current status is accepted, since an operator may
/// need to correct state the hook stream never would have produced. The one
/// edge the table calls out by name, `Complete -> Active`, is the only edge
/// explicitly forbidden here — `Complete` does not accept any explicit exit.
pub fn apply_explicit(current: AgentStatus, requested: AgentStatus) -> Result<AgentStatus, AppError> {
    if current == requested {
        return Ok(current);
    }
    if current == AgentStatus::Complete {
        return Err(AppError::InvalidTransition(format!(
            "{current:?} -> {requested:?} is not permitted: Complete is terminal"
        )));
    }
    Ok(requested)
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
