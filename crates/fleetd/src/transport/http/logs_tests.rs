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
async fn appended_log_is_returned_newest_first() {
    let server = test_server();
    server
        .post("/agents")
        .json(&json!({"id": "a1"}))
        .await
        .assert_status_ok();

    server
        .post("/agents/a1/logs")
        .json(&json!({"level": "info", "message": "first"}))
        .await
        .assert_status_ok();
    server
        .post("/agents/a1/logs")
        .json(&json!({"level": "warn", "message": "second"}))
        .await
        .assert_status_ok();

    let response = server.get("/agents/a1/logs").await;
    response.assert_status_ok();
    let entries: Vec<crate::model::LogEntry> = response.json();
    assert_eq!(entries[0].message, "second");
    assert_eq!(entries[1].message, "first");
}

#[tokio::test]
async fn log_append_on_missing_agent_is_404() {
    let server = test_server();
    let response = server
        .post("/agents/nope/logs")
        .json(&json!({"message": "hi"}))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn logs_query_limit_is_honored() {
    let server = test_server();
    server
        .post("/agents")
        .json(&json!({"id": "a1"}))
        .await
        .assert_status_ok();
    for i in 0..5 {
        server
            .post("/agents/a1/logs")
            .json(&json!({"message": format!("m{i}")}))
            .await
            .assert_status_ok();
    }

    let response = server.get("/agents/a1/logs?limit=2").await;
    response.assert_status_ok();
    let entries: Vec<crate::model::LogEntry> = response.json();
    assert_eq!(entries.len(), 2);
}
