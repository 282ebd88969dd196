// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates normalized events into registry mutations.

use std::sync::Arc;

use crate::event::Event;
use crate::model::Agent;
use crate::registry::AgentRegistry;

pub struct EventRouter {
    registry: Arc<AgentRegistry>,
}

impl EventRouter {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Run the full per-event algorithm: enter the agent's critical section
    /// (auto-registering if needed), derive and apply the next status,
    /// append a log entry, merge a context patch if present, and publish to
    /// `agent:<id>`, `project:<path>`, and `all` — all before the section is
    /// released, so concurrent events on the same agent publish in the same
    /// order they applied.
    pub fn handle(&self, event: Event) -> Agent {
        self.registry.apply_event(&event).agent
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
