// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook event wire envelope and its normalization into a canonical [`Event`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

/// Canonical event kinds the router knows how to drive the state machine
/// from. `Generic` absorbs any `type` string this service doesn't
/// recognize; it is stored as a log entry with no status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AgentStarted,
    AgentStopped,
    AgentErrored,
    ToolPre,
    ToolPost,
    ContextUpdated,
    TaskStarted,
    TaskCompleted,
    Notification,
    SubagentStopped,
    ConversationStart,
    ConversationEnd,
    Generic,
}

fn classify(type_: &str) -> EventKind {
    match type_ {
        "agent.started" => EventKind::AgentStarted,
        "agent.stopped" => EventKind::AgentStopped,
        "agent.error" => EventKind::AgentErrored,
        "tool.pre_use" => EventKind::ToolPre,
        "tool.post_use" => EventKind::ToolPost,
        "context.updated" => EventKind::ContextUpdated,
        "task.started" => EventKind::TaskStarted,
        "task.completed" => EventKind::TaskCompleted,
        "conversation_start" => EventKind::ConversationStart,
        "conversation_end" => EventKind::ConversationEnd,
        "notification" => EventKind::Notification,
        "subagent_stop" => EventKind::SubagentStopped,
        _ => EventKind::Generic,
    }
}

fn default_data() -> Value {
    Value::Object(serde_json::Map::new())
}

/// The raw wire shape POSTed to the ingestion endpoint, before
/// normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub timestamp: String,
    #[serde(default = "default_data")]
    pub data: Value,
}

/// A normalized, validated event ready for the router.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub raw_type: String,
    pub agent_id: String,
    /// The producer-supplied timestamp, retained for forensic purposes only
    /// (see §5/§9 — the registry assigns its own timestamps on append).
    pub client_timestamp: DateTime<Utc>,
    pub data: Value,
}

fn require_field(data: &Value, field: &str, kind: EventKind) -> Result<(), AppError> {
    if data.get(field).is_some() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{kind:?} event missing required data field `{field}`"
        )))
    }
}

fn validate_required_data(kind: EventKind, data: &Value) -> Result<(), AppError> {
    match kind {
        EventKind::ToolPre | EventKind::ToolPost => require_field(data, "tool_name", kind),
        EventKind::AgentErrored => require_field(data, "error", kind),
        EventKind::ContextUpdated => require_field(data, "context", kind),
        EventKind::TaskStarted | EventKind::TaskCompleted => require_field(data, "task", kind),
        EventKind::Notification => {
            require_field(data, "level", kind)?;
            require_field(data, "message", kind)
        }
        EventKind::AgentStarted
        | EventKind::AgentStopped
        | EventKind::SubagentStopped
        | EventKind::ConversationStart
        | EventKind::ConversationEnd
        | EventKind::Generic => Ok(()),
    }
}

impl Event {
    /// Parse and validate a raw envelope. Never mutates anything; a
    /// validation failure here must not reach the registry.
    pub fn try_from_raw(raw: RawEnvelope) -> Result<Self, AppError> {
        if raw.agent_id.trim().is_empty() {
            return Err(AppError::Validation("agentId must not be empty".into()));
        }
        let client_timestamp = DateTime::parse_from_rfc3339(&raw.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::Validation(format!("invalid RFC3339 timestamp: {e}")))?;
        let kind = classify(&raw.type_);
        validate_required_data(kind, &raw.data)?;
        Ok(Event {
            kind,
            raw_type: raw.type_,
            agent_id: raw.agent_id,
            client_timestamp,
            data: raw.data,
        })
    }

    /// `projectPath` carried on the envelope, if any (used to seed a newly
    /// auto-registered agent).
    pub fn project_path(&self) -> Option<&str> {
        self.data.get("projectPath").and_then(Value::as_str)
    }

    /// Short human-readable summary used as a log entry's message.
    pub fn summary(&self) -> String {
        match self.kind {
            EventKind::ToolPre | EventKind::ToolPost => {
                let tool = self
                    .data
                    .get("tool_name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                format!("{}: {tool}", self.raw_type)
            }
            EventKind::Notification => {
                let message = self
                    .data
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                format!("{}: {message}", self.raw_type)
            }
            EventKind::AgentErrored => {
                let error = self.data.get("error").and_then(Value::as_str).unwrap_or("");
                format!("{}: {error}", self.raw_type)
            }
            _ => self.raw_type.clone(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
