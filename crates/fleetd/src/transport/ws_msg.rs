// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the subscriber control protocol (§4.3/§4.5).

use serde::{Deserialize, Serialize};

use crate::model::{Agent, LogEntry};

/// Messages the server pushes to a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once, immediately after a connection is accepted.
    Welcome {
        #[serde(rename = "subscriberId")]
        subscriber_id: String,
    },
    /// Sent every `PingInterval`; the client is expected to reply `Pong`.
    Ping,
    /// An agent was created, had its status/context change, or received a
    /// log entry. `entry` carries the log entry the triggering mutation
    /// appended, if any (one broadcast message per mutation, per the
    /// router's publish step).
    AgentUpdated {
        topic: String,
        agent: Agent,
        #[serde(skip_serializing_if = "Option::is_none")]
        entry: Option<LogEntry>,
    },
    /// `delete(id)` was called; terminal message for `agent:<id>` and `all`.
    Tombstone {
        topic: String,
        #[serde(rename = "agentId")]
        agent_id: String,
    },
    /// Sent best-effort when a subscriber's queue overflows, immediately
    /// before the connection is closed.
    Overflow,
    /// Sent before the server closes the connection for any other reason.
    Close { reason: String },
}

/// Messages a subscriber sends to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topics: Vec<String> },
    Unsubscribe { topics: Vec<String> },
    Pong,
}
