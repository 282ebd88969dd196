// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct log-append and log-read handlers (§6.2).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::model::{Agent, LogEntry, LogLevel};
use crate::transport::AppState;

#[derive(Debug, Deserialize)]
pub struct AppendLogRequest {
    #[serde(default = "default_level")]
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

/// `POST /agents/{id}/logs` — append a log entry outside the hook pipeline
/// (e.g. dashboard-initiated annotations).
pub async fn append(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AppendLogRequest>,
) -> Result<Json<Agent>, AppError> {
    let agent = state
        .registry
        .append_log(&id, req.level, req.message, req.metadata)?;
    Ok(Json(agent))
}

#[derive(Debug, Deserialize, Default)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// `GET /agents/{id}/logs` — newest-first log entries.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    state
        .registry
        .logs(&id, query.limit)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("agent {id} not found")))
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
