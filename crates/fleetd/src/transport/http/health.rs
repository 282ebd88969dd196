// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /health` — liveness and basic fleet counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::transport::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: i64,
    pub agent_count: usize,
    pub agents_by_status: BTreeMap<String, usize>,
    pub subscriber_count: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let agents_by_status: BTreeMap<String, usize> = state
        .registry
        .counts_by_status()
        .into_iter()
        .map(|(status, count)| (status.as_str().to_string(), count))
        .collect();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: chrono::Utc::now()
            .signed_duration_since(state.started_at)
            .num_seconds(),
        agent_count: state.registry.agent_count(),
        agents_by_status,
        subscriber_count: state.broadcaster.subscriber_count(),
    })
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
