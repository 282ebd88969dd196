// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent query and mutation HTTP handlers (§6.2).

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::model::{Agent, AgentQuery, AgentRegistration, AgentStatus};
use crate::transport::AppState;

/// `POST /agents` — explicit registration (idempotent).
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(reg): Json<AgentRegistration>,
) -> Result<Json<Agent>, AppError> {
    let (agent, _created) = state.registry.register(reg)?;
    Ok(Json(agent))
}

/// `GET /agents` — filtered, paginated listing.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentQuery>,
) -> Json<Vec<Agent>> {
    Json(state.registry.list(&query))
}

/// `GET /agents/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, AppError> {
    state
        .registry
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("agent {id} not found")))
}

/// `DELETE /agents/{id}`
pub async fn delete_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, AppError> {
    let agent = state
        .registry
        .delete(&id)
        .ok_or_else(|| AppError::NotFound(format!("agent {id} not found")))?;
    Ok(Json(agent))
}

#[derive(Debug, serde::Deserialize)]
pub struct StatusUpdate {
    pub status: AgentStatus,
}

/// `PATCH /agents/{id}/status`
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Agent>, AppError> {
    let agent = state.registry.update_status(&id, body.status)?;
    Ok(Json(agent))
}

/// `PATCH /agents/{id}/context`
pub async fn update_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<Agent>, AppError> {
    let agent = state.registry.update_context(&id, patch)?;
    Ok(Json(agent))
}

/// `GET /agents/hierarchy` — the full parent/child forest.
pub async fn hierarchy_root(
    State(state): State<Arc<AppState>>,
) -> Json<HashMap<String, Vec<String>>> {
    Json(state.registry.hierarchy(None))
}

/// `GET /agents/hierarchy/{root_id}` — the subtree rooted at `root_id`.
pub async fn hierarchy(
    State(state): State<Arc<AppState>>,
    Path(root_id): Path<String>,
) -> Json<HashMap<String, Vec<String>>> {
    Json(state.registry.hierarchy(Some(&root_id)))
}

/// `GET /agents/search/{query}` — substring search over id/tags/recent logs.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> Json<Vec<Agent>> {
    let q = AgentQuery {
        q: Some(query),
        ..Default::default()
    };
    Json(state.registry.list(&q))
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
