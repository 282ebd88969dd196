// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authoritative in-process agent state.
//!
//! Each agent has its own [`Mutex`], so concurrent events targeting
//! different agents never contend with each other; events targeting the
//! same agent are totally ordered by the order in which they acquire that
//! agent's lock. The top-level map is a short-held [`RwLock`] covering only
//! insert/remove — it is never held across a per-agent mutation or any I/O.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::broadcaster::Broadcaster;
use crate::error::AppError;
use crate::event::{Event, EventKind};
use crate::model::{Agent, AgentQuery, AgentRegistration, AgentStatus, LogEntry, LogLevel, Topic};
use crate::sanitize::{sanitize_map, SanitizeLimits};
use crate::state_machine;
use crate::transport::ws_msg::ServerMessage;

struct Slot {
    agent: Mutex<Agent>,
}

/// Authoritative agent registry, layered over an (currently in-memory only)
/// store.
///
/// Owns the [`Broadcaster`] handle so every mutation can publish its
/// `AgentUpdated`/`Tombstone` message while the agent's critical section is
/// still held: a caller that mutated then published separately would let
/// two concurrent mutations on the same agent apply in lock order but
/// publish out of order.
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Arc<Slot>>>,
    next_seq: AtomicU64,
    max_logs_per_agent: usize,
    sanitize_limits: SanitizeLimits,
    broadcaster: Arc<Broadcaster>,
}

/// Result of applying a normalized event: the agent's state after the
/// mutation, and whether its status actually changed (used by the router to
/// decide log framing; a broadcast is published either way per §4.4).
pub struct ApplyOutcome {
    pub agent: Agent,
    pub previous_status: AgentStatus,
}

impl AgentRegistry {
    pub fn new(max_logs_per_agent: usize, sanitize_limits: SanitizeLimits, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
            max_logs_per_agent,
            sanitize_limits,
            broadcaster,
        }
    }

    /// Publish `AgentUpdated` to `agent:<id>`, `project:<path>`, and `all`.
    /// Callers must hold the agent's `MutexGuard` for the duration of this
    /// call so the publish happens before the critical section is released.
    fn publish_update(&self, agent: &Agent, entry: Option<LogEntry>) {
        for topic in Topic::fanout_for(&agent.id, &agent.project_path) {
            self.broadcaster.publish(
                &topic,
                ServerMessage::AgentUpdated {
                    topic: topic.to_string(),
                    agent: agent.clone(),
                    entry: entry.clone(),
                },
            );
        }
    }

    /// Publish a terminal `Tombstone` to `agent:<id>` and `all`. Same
    /// under-lock requirement as [`Self::publish_update`].
    fn publish_tombstone(&self, agent: &Agent) {
        for topic in [Topic::Agent(agent.id.clone()), Topic::All] {
            self.broadcaster.publish(
                &topic,
                ServerMessage::Tombstone {
                    topic: topic.to_string(),
                    agent_id: agent.id.clone(),
                },
            );
        }
    }

    fn new_agent(&self, id: String, project_path: String, parent_id: Option<String>, tags: std::collections::BTreeSet<String>, context: Map<String, Value>) -> Agent {
        let now = Utc::now();
        Agent {
            id,
            status: AgentStatus::Idle,
            project_path,
            parent_id,
            context: sanitize_map(&context, self.sanitize_limits),
            tags,
            created: now,
            last_activity: now,
            logs: Vec::new(),
        }
    }

    fn slot_for(&self, id: &str) -> Arc<Slot> {
        if let Some(existing) = crate::lockext::read(&self.agents).get(id) {
            return existing.clone();
        }
        let mut agents = crate::lockext::write(&self.agents);
        agents
            .entry(id.to_string())
            .or_insert_with(|| {
                Arc::new(Slot {
                    agent: Mutex::new(self.new_agent(id.to_string(), String::new(), None, Default::default(), Map::new())),
                })
            })
            .clone()
    }

    fn push_log_locked(&self, agent: &mut Agent, level: LogLevel, message: String, metadata: Map<String, Value>) -> LogEntry {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            seq,
            level,
            message,
            metadata: sanitize_map(&metadata, self.sanitize_limits),
        };
        let mut deque: VecDeque<LogEntry> = std::mem::take(&mut agent.logs).into();
        deque.push_back(entry.clone());
        while deque.len() > self.max_logs_per_agent {
            deque.pop_front();
        }
        agent.logs = deque.into();
        agent.last_activity = Utc::now();
        entry
    }

    /// Explicit registration. Idempotent: re-registering an existing id
    /// returns it unchanged (aside from an informational log entry) rather
    /// than erroring.
    pub fn register(&self, reg: AgentRegistration) -> Result<(Agent, bool), AppError> {
        if reg.id.trim().is_empty() {
            return Err(AppError::Validation("agent id must not be empty".into()));
        }
        let mut agents = crate::lockext::write(&self.agents);
        if let Some(slot) = agents.get(&reg.id) {
            let slot = slot.clone();
            drop(agents);
            let mut agent = crate::lockext::lock(&slot.agent);
            self.push_log_locked(
                &mut agent,
                LogLevel::Info,
                "re-registration attempted; agent already exists".to_string(),
                Map::new(),
            );
            return Ok((agent.clone(), false));
        }
        let agent = self.new_agent(reg.id.clone(), reg.project_path, reg.parent_id, reg.tags, reg.context);
        let slot = Arc::new(Slot {
            agent: Mutex::new(agent.clone()),
        });
        // Lock the brand-new slot before anyone else can reach it through
        // the map, so the publish below is still the first thing to happen
        // inside this agent's critical section.
        let guard = crate::lockext::lock(&slot.agent);
        agents.insert(reg.id.clone(), slot.clone());
        drop(agents);
        self.publish_update(&guard, None);
        drop(guard);
        Ok((agent, true))
    }

    /// Apply a normalized event: auto-register if missing, derive and apply
    /// the next status, append a log entry, and (for `ContextUpdated`)
    /// merge the context patch — all under the agent's critical section.
    pub fn apply_event(&self, event: &Event) -> ApplyOutcome {
        let slot = self.slot_for(&event.agent_id);
        let mut agent = crate::lockext::lock(&slot.agent);

        if agent.project_path.is_empty() {
            if let Some(path) = event.project_path() {
                agent.project_path = path.to_string();
            }
        }

        let previous_status = agent.status;
        let next_status = state_machine::next_for_event(agent.status, event.kind);
        agent.status = next_status;

        if matches!(event.kind, EventKind::ContextUpdated) {
            if let Some(patch) = event.data.get("context").and_then(Value::as_object) {
                let sanitized = sanitize_map(patch, self.sanitize_limits);
                for (k, v) in sanitized {
                    agent.context.insert(k, v);
                }
            }
        }

        let metadata = event
            .data
            .as_object()
            .cloned()
            .unwrap_or_default();
        let entry = self.push_log_locked(&mut agent, LogLevel::Info, event.summary(), metadata);
        self.publish_update(&agent, Some(entry));

        ApplyOutcome {
            agent: agent.clone(),
            previous_status,
        }
    }

    /// Explicit status change via the query API; rejects disallowed edges.
    pub fn update_status(&self, id: &str, requested: AgentStatus) -> Result<Agent, AppError> {
        let slot = {
            let agents = crate::lockext::read(&self.agents);
            agents
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("agent {id} not found")))?
        };
        let mut agent = crate::lockext::lock(&slot.agent);
        let new_status = state_machine::apply_explicit(agent.status, requested)?;
        if new_status != agent.status {
            agent.status = new_status;
            agent.last_activity = Utc::now();
        }
        self.publish_update(&agent, None);
        Ok(agent.clone())
    }

    /// Shallow-merge a sanitized context patch.
    pub fn update_context(&self, id: &str, patch: Map<String, Value>) -> Result<Agent, AppError> {
        let slot = {
            let agents = crate::lockext::read(&self.agents);
            agents
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("agent {id} not found")))?
        };
        let mut agent = crate::lockext::lock(&slot.agent);
        let sanitized = sanitize_map(&patch, self.sanitize_limits);
        for (k, v) in sanitized {
            agent.context.insert(k, v);
        }
        agent.last_activity = Utc::now();
        self.publish_update(&agent, None);
        Ok(agent.clone())
    }

    /// Append a log entry directly (`POST /agents/{id}/logs`).
    pub fn append_log(&self, id: &str, level: LogLevel, message: String, metadata: Map<String, Value>) -> Result<Agent, AppError> {
        let slot = {
            let agents = crate::lockext::read(&self.agents);
            agents
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("agent {id} not found")))?
        };
        let mut agent = crate::lockext::lock(&slot.agent);
        let entry = self.push_log_locked(&mut agent, level, message, metadata);
        self.publish_update(&agent, Some(entry));
        Ok(agent.clone())
    }

    pub fn get(&self, id: &str) -> Option<Agent> {
        let agents = crate::lockext::read(&self.agents);
        let slot = agents.get(id)?.clone();
        drop(agents);
        Some(crate::lockext::lock(&slot.agent).clone())
    }

    pub fn logs(&self, id: &str, limit: Option<usize>) -> Option<Vec<LogEntry>> {
        let agent = self.get(id)?;
        let mut logs = agent.logs;
        logs.reverse(); // newest-first
        if let Some(limit) = limit {
            logs.truncate(limit);
        }
        Some(logs)
    }

    /// Read-only snapshot of all agents matching `query`. Never holds a
    /// per-agent lock across another agent's lock or any I/O.
    pub fn list(&self, query: &AgentQuery) -> Vec<Agent> {
        let snapshot: Vec<Agent> = {
            let agents = crate::lockext::read(&self.agents);
            agents
                .values()
                .map(|slot| crate::lockext::lock(&slot.agent).clone())
                .collect()
        };

        let mut filtered: Vec<Agent> = snapshot
            .into_iter()
            .filter(|a| {
                query
                    .project_path
                    .as_ref()
                    .map(|p| &a.project_path == p)
                    .unwrap_or(true)
            })
            .filter(|a| query.status.map(|s| a.status == s).unwrap_or(true))
            .filter(|a| {
                query
                    .parent_id
                    .as_ref()
                    .map(|p| a.parent_id.as_deref() == Some(p.as_str()))
                    .unwrap_or(true)
            })
            .filter(|a| query.tag.as_ref().map(|t| a.tags.contains(t)).unwrap_or(true))
            .filter(|a| {
                query
                    .q
                    .as_ref()
                    .map(|needle| matches_substring_search(a, needle))
                    .unwrap_or(true)
            })
            .collect();

        filtered.sort_by(|a, b| a.id.cmp(&b.id));

        let offset = query.offset.unwrap_or(0);
        if offset >= filtered.len() {
            return Vec::new();
        }
        filtered.drain(..offset);
        if let Some(limit) = query.limit {
            filtered.truncate(limit);
        }
        filtered
    }

    /// Parent -> children adjacency for the forest rooted at `root_id`, or
    /// the whole forest if `root_id` is absent. Cycles (which invariant #2
    /// says should never occur) are defended against with a visited set so
    /// a malformed parent chain can never loop forever.
    pub fn hierarchy(&self, root_id: Option<&str>) -> HashMap<String, Vec<String>> {
        let snapshot: Vec<Agent> = {
            let agents = crate::lockext::read(&self.agents);
            agents
                .values()
                .map(|slot| crate::lockext::lock(&slot.agent).clone())
                .collect()
        };

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for agent in &snapshot {
            if let Some(parent) = &agent.parent_id {
                children.entry(parent.clone()).or_default().push(agent.id.clone());
            }
        }

        let Some(root) = root_id else {
            return children;
        };

        let mut out = HashMap::new();
        let mut visited = std::collections::HashSet::new();
        let mut stack = vec![root.to_string()];
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let kids = children.get(&id).cloned().unwrap_or_default();
            stack.extend(kids.iter().cloned());
            out.insert(id, kids);
        }
        out
    }

    /// Remove an agent, publishing its tombstone under the same critical
    /// section before returning its last known state.
    pub fn delete(&self, id: &str) -> Option<Agent> {
        let slot = {
            let mut agents = crate::lockext::write(&self.agents);
            agents.remove(id)
        }?;
        let agent = crate::lockext::lock(&slot.agent);
        self.publish_tombstone(&agent);
        Some(agent.clone())
    }

    /// Agents whose `lastActivity` is older than `cutoff_secs` seconds ago,
    /// optionally restricted to a status. Used by the retention worker.
    pub fn stale_agent_ids(&self, cutoff_secs: i64, status: Option<AgentStatus>) -> Vec<String> {
        let now = Utc::now();
        let agents = crate::lockext::read(&self.agents);
        agents
            .values()
            .filter_map(|slot| {
                let agent = crate::lockext::lock(&slot.agent);
                let age = now.signed_duration_since(agent.last_activity).num_seconds();
                let status_matches = status.map(|s| agent.status == s).unwrap_or(true);
                (age > cutoff_secs && status_matches).then(|| agent.id.clone())
            })
            .collect()
    }

    pub fn agent_count(&self) -> usize {
        crate::lockext::read(&self.agents).len()
    }

    /// Number of agents currently in each status. Used by `/health`.
    pub fn counts_by_status(&self) -> HashMap<AgentStatus, usize> {
        let agents = crate::lockext::read(&self.agents);
        let mut counts = HashMap::new();
        for slot in agents.values() {
            let status = crate::lockext::lock(&slot.agent).status;
            *counts.entry(status).or_insert(0usize) += 1;
        }
        counts
    }

    /// Re-assert the per-agent log cap on every agent. The cap is already
    /// enforced on every append; this is the retention sweep's safety net
    /// against a cap lowered by reconfiguration since an agent's oldest
    /// surviving entries were appended.
    pub fn truncate_all_logs(&self) {
        let slots: Vec<Arc<Slot>> = crate::lockext::read(&self.agents).values().cloned().collect();
        for slot in slots {
            let mut agent = crate::lockext::lock(&slot.agent);
            if agent.logs.len() > self.max_logs_per_agent {
                let excess = agent.logs.len() - self.max_logs_per_agent;
                agent.logs.drain(..excess);
            }
        }
    }
}

fn matches_substring_search(agent: &Agent, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    if agent.id.to_lowercase().contains(&needle) {
        return true;
    }
    if agent.tags.iter().any(|t| t.to_lowercase().contains(&needle)) {
        return true;
    }
    agent
        .logs
        .iter()
        .rev()
        .take(50)
        .any(|l| l.message.to_lowercase().contains(&needle))
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
