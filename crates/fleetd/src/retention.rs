// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sweeper enforcing per-agent log caps, idle-agent expiration,
//! and completed-agent TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::model::AgentStatus;
use crate::registry::AgentRegistry;

pub struct RetentionWorker {
    registry: Arc<AgentRegistry>,
    interval: Duration,
    completed_ttl_secs: i64,
    idle_ttl_secs: i64,
}

impl RetentionWorker {
    pub fn new(
        registry: Arc<AgentRegistry>,
        interval: Duration,
        completed_ttl_secs: u64,
        idle_ttl_secs: u64,
    ) -> Self {
        Self {
            registry,
            interval,
            completed_ttl_secs: completed_ttl_secs as i64,
            idle_ttl_secs: idle_ttl_secs as i64,
        }
    }

    /// Run sweeps on `interval` until `shutdown` is cancelled. Each agent is
    /// processed independently and a failure in one (there are none today;
    /// this is in-memory-only) can never block the others — the sweep is
    /// cancellable between agents, never mid-mutation.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("retention worker started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => {
                    debug!("retention worker shutting down");
                    return;
                }
            }
            self.sweep_once();
        }
    }

    /// One retention pass: completed-agent TTL, idle-agent TTL (if enabled),
    /// then a log-cap sweep over every surviving agent. The cap is already
    /// enforced on every append; this re-asserts it so a `MaxLogsPerAgent`
    /// lowered by reconfiguration is honored by agents that logged under the
    /// old, higher cap.
    pub fn sweep_once(&self) {
        for id in self
            .registry
            .stale_agent_ids(self.completed_ttl_secs, Some(AgentStatus::Complete))
        {
            self.retire(&id);
        }

        if self.idle_ttl_secs > 0 {
            for id in self.registry.stale_agent_ids(self.idle_ttl_secs, None) {
                self.retire(&id);
            }
        }

        self.registry.truncate_all_logs();
    }

    fn retire(&self, id: &str) {
        let Some(agent) = self.registry.delete(id) else {
            return;
        };
        info!(agent_id = %id, status = ?agent.status, "agent retired by retention sweep");
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
