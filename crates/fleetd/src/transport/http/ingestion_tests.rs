// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use crate::config::Config;
use crate::transport::{build_router, AppState};

fn test_server() -> TestServer {
    let config = Arc::new(Config {
        listen_address: ":0".into(),
        max_logs_per_agent: 1000,
        max_subscriber_queue: 256,
        ping_interval_secs: 30,
        pong_deadline_secs: 10,
        ingestion_deadline_secs: 5,
        completed_ttl_secs: 86400,
        idle_ttl_secs: 604800,
        retention_interval_secs: 300,
        max_string_len: 4096,
        max_sanitize_depth: 8,
        store_backend: crate::config::StoreBackend::Memory,
        store_uri: None,
        log_format: "json".into(),
        log_level: "info".into(),
    });
    let state = Arc::new(AppState::new(config));
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn ingesting_a_well_formed_event_auto_registers_and_activates() {
    let server = test_server();
    let response = server
        .post("/events")
        .json(&json!({
            "type": "tool.pre_use",
            "agentId": "a1",
            "timestamp": "2026-07-27T12:00:00Z",
            "data": {"tool_name": "Edit", "projectPath": "/p"},
        }))
        .await;
    response.assert_status_ok();
    let agent: crate::model::Agent = response.json();
    assert_eq!(agent.id, "a1");
    assert_eq!(agent.status, crate::model::AgentStatus::Active);
    assert_eq!(agent.project_path, "/p");
}

#[tokio::test]
async fn ingesting_an_event_missing_required_data_is_rejected() {
    let server = test_server();
    let response = server
        .post("/events")
        .json(&json!({
            "type": "tool.pre_use",
            "agentId": "a1",
            "timestamp": "2026-07-27T12:00:00Z",
            "data": {},
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn ingesting_with_empty_agent_id_is_rejected() {
    let server = test_server();
    let response = server
        .post("/events")
        .json(&json!({
            "type": "tool.pre_use",
            "agentId": "",
            "timestamp": "2026-07-27T12:00:00Z",
            "data": {"tool_name": "Edit"},
        }))
        .await;
    response.assert_status_bad_request();
}
