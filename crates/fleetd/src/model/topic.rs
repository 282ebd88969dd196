// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// A broadcaster subscription key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Events about a specific agent.
    Agent(String),
    /// Events about any agent with a given `project_path`.
    Project(String),
    /// Every event.
    All,
}

impl Topic {
    /// Parse a wire-format topic string (`"agent:<id>"`, `"project:<path>"`,
    /// `"all"`). Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "all" {
            return Some(Self::All);
        }
        if let Some(id) = raw.strip_prefix("agent:") {
            if !id.is_empty() {
                return Some(Self::Agent(id.to_string()));
            }
        }
        if let Some(path) = raw.strip_prefix("project:") {
            if !path.is_empty() {
                return Some(Self::Project(path.to_string()));
            }
        }
        None
    }

    /// The set of topics a single event touches: its own agent topic, its
    /// project topic, and `all`.
    pub fn fanout_for(agent_id: &str, project_path: &str) -> [Self; 3] {
        [
            Self::Agent(agent_id.to_string()),
            Self::Project(project_path.to_string()),
            Self::All,
        ]
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "agent:{id}"),
            Self::Project(path) => write!(f, "project:{path}"),
            Self::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
