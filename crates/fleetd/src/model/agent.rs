// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a monitored agent. See the transition table in
/// [`crate::state_machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Active,
    Handoff,
    Error,
    Complete,
}

impl AgentStatus {
    /// `Complete` and `Error` accept no further lifecycle transitions except
    /// the explicit recovery edges the state machine defines; they still
    /// accept log appends.
    pub fn is_terminal_for_lifecycle(self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Wire string, matching the `snake_case` rename used for (de)serialization.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Handoff => "handoff",
            Self::Error => "error",
            Self::Complete => "complete",
        }
    }
}

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single entry in an agent's bounded log ring.
///
/// `id`, `timestamp`, and `seq` are assigned by the registry at append time,
/// never trusted from the producer (see the concurrency model's clock rule).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A monitored agent and its bounded log history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub status: AgentStatus,
    #[serde(rename = "projectPath")]
    pub project_path: String,
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created: DateTime<Utc>,
    #[serde(rename = "lastActivity")]
    pub last_activity: DateTime<Utc>,
    pub logs: Vec<LogEntry>,
}

/// Explicit registration request (`POST /agents`).
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRegistration {
    pub id: String,
    #[serde(default, rename = "projectPath")]
    pub project_path: String,
    #[serde(default, rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// Filter/pagination parameters for `GET /agents`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentQuery {
    #[serde(default, rename = "projectPath")]
    pub project_path: Option<String>,
    #[serde(default)]
    pub status: Option<AgentStatus>,
    #[serde(default, rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
