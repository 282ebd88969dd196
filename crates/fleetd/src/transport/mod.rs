// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport: ingestion, query, and subscriber endpoints.

pub mod http;
pub mod ws;
pub mod ws_msg;

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::routing::{get, patch, post};
use axum::Router;
use chrono::{DateTime, Utc};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::broadcaster::Broadcaster;
use crate::config::Config;
use crate::error::AppError;
use crate::registry::AgentRegistry;
use crate::router::EventRouter;

/// Shared application state. Named distinctly from the spec's `Store`
/// persistence interface (that concept lives behind [`AgentRegistry`]
/// instead) — `AppState` here is the axum `State` extractor payload, the
/// same role the teacher's `Store` struct plays in its own transport layer.
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub broadcaster: Arc<Broadcaster>,
    pub router: Arc<EventRouter>,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let sanitize_limits = crate::sanitize::SanitizeLimits {
            max_string_len: config.max_string_len,
            max_depth: config.max_sanitize_depth,
        };
        let broadcaster = Arc::new(Broadcaster::new(config.max_subscriber_queue));
        let registry = Arc::new(AgentRegistry::new(config.max_logs_per_agent, sanitize_limits, broadcaster.clone()));
        let router = Arc::new(EventRouter::new(registry.clone()));
        Self {
            registry,
            broadcaster,
            router,
            config,
            started_at: Utc::now(),
        }
    }

    pub fn ingestion_deadline(&self) -> Duration {
        Duration::from_secs(self.config.ingestion_deadline_secs)
    }
}

/// A request exceeding `IngestionDeadline` becomes a `503 Transient`, per
/// the at-most-once deadline rule (§4.6): whatever had already committed
/// stays committed, no rollback.
async fn ingestion_timed_out(_err: tower::BoxError) -> AppError {
    AppError::Transient("ingestion request exceeded its deadline".to_string())
}

/// Assemble the full router: ingestion, query, and subscriber endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    let ingestion_deadline = state.ingestion_deadline();
    let ingestion_route = post(http::ingestion::ingest).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(ingestion_timed_out))
            .timeout(ingestion_deadline),
    );

    Router::new()
        .route("/events", ingestion_route)
        .route("/agents", post(http::agents::register).get(http::agents::list))
        .route("/agents/hierarchy", get(http::agents::hierarchy_root))
        .route("/agents/hierarchy/{root_id}", get(http::agents::hierarchy))
        .route("/agents/search/{query}", get(http::agents::search))
        .route(
            "/agents/{id}",
            get(http::agents::get).delete(http::agents::delete_agent),
        )
        .route("/agents/{id}/status", patch(http::agents::update_status))
        .route("/agents/{id}/context", patch(http::agents::update_context))
        .route(
            "/agents/{id}/logs",
            post(http::logs::append).get(http::logs::list),
        )
        .route("/health", get(http::health::health))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
