// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /events` — the hook ingestion endpoint (§4.4/§6.2).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::event::{Event, RawEnvelope};
use crate::model::Agent;
use crate::transport::AppState;

/// Accept one normalized hook event, apply it, and return the agent's state
/// after the mutation. A structurally valid envelope always succeeds;
/// malformed envelopes (empty `agentId`, bad timestamp, missing per-kind
/// required field) are rejected with `400` before anything is mutated.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawEnvelope>,
) -> Result<Json<Agent>, AppError> {
    let event = Event::try_from_raw(raw)?;
    let agent = state.router.handle(event);
    Ok(Json(agent))
}

#[cfg(test)]
#[path = "ingestion_tests.rs"]
mod tests;
