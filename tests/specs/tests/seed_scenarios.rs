// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box seed scenarios S1-S6, run in-process against a real router.
//!
//! Replaces the teacher's binary-spawn smoke harness (`CoopProcess`): this
//! service has no PTY/terminal surface that requires driving a spawned
//! process over a real socket, so the router is exercised directly with
//! `axum-test`.

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use fleetd::config::{Config, StoreBackend};
use fleetd::model::{Agent, AgentStatus, LogEntry};
use fleetd::retention::RetentionWorker;
use fleetd::transport::ws_msg::ServerMessage;
use fleetd::transport::{build_router, AppState};
use serde_json::json;

fn config() -> Config {
    Config {
        listen_address: ":0".into(),
        max_logs_per_agent: 1000,
        max_subscriber_queue: 16,
        ping_interval_secs: 30,
        pong_deadline_secs: 10,
        ingestion_deadline_secs: 5,
        completed_ttl_secs: 1,
        idle_ttl_secs: 604800,
        retention_interval_secs: 300,
        max_string_len: 4096,
        max_sanitize_depth: 8,
        store_backend: StoreBackend::Memory,
        store_uri: None,
        log_format: "json".into(),
        log_level: "info".into(),
    }
}

fn server() -> TestServer {
    let state = Arc::new(AppState::new(Arc::new(config())));
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn s1_auto_registration_on_first_tool_use() {
    let server = server();

    server
        .post("/events")
        .json(&json!({
            "type": "tool.pre_use",
            "agentId": "a1",
            "timestamp": "2026-07-27T12:00:00Z",
            "data": {"tool_name": "Edit", "projectPath": "/p"},
        }))
        .await
        .assert_status_ok();

    let response = server.get("/agents/a1").await;
    response.assert_status_ok();
    let agent: Agent = response.json();
    assert_eq!(agent.status, AgentStatus::Active);
    assert_eq!(agent.project_path, "/p");
    assert!(agent.logs.iter().any(|l| l.message.contains("Edit")));
}

#[tokio::test]
async fn s2_status_machine_rejects_forbidden_transition() {
    let server = server();
    server.post("/agents").json(&json!({"id": "a2"})).await.assert_status_ok();

    let response = server
        .patch("/agents/a2/status")
        .json(&json!({"status": "complete"}))
        .await;
    response.assert_status_ok();
    let agent: Agent = response.json();
    assert_eq!(agent.status, AgentStatus::Complete);

    let response = server
        .patch("/agents/a2/status")
        .json(&json!({"status": "active"}))
        .await;
    response.assert_status_bad_request();

    let agent: Agent = server.get("/agents/a2").await.json();
    assert_eq!(agent.status, AgentStatus::Complete);
}

#[tokio::test]
async fn s3_sanitization() {
    let server = server();
    server.post("/agents").json(&json!({"id": "a3"})).await.assert_status_ok();

    let mut socket = server.get_websocket("/ws?topics=agent:a3").await.into_websocket().await;
    let _welcome: ServerMessage = socket.receive_json().await;

    server
        .patch("/agents/a3/context")
        .json(&json!({"password": "hunter2", "publicData": "ok"}))
        .await
        .assert_status_ok();

    let agent: Agent = server.get("/agents/a3").await.json();
    assert_eq!(agent.context.get("password").and_then(|v| v.as_str()), Some("[REDACTED]"));
    assert_eq!(agent.context.get("publicData").and_then(|v| v.as_str()), Some("ok"));

    let update: ServerMessage = socket.receive_json().await;
    match update {
        ServerMessage::AgentUpdated { agent, .. } => {
            assert_eq!(
                agent.context.get("password").and_then(|v| v.as_str()),
                Some("[REDACTED]")
            );
        }
        other => panic!("expected AgentUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn s4_log_ring_eviction() {
    let server = server();
    server.post("/agents").json(&json!({"id": "a4"})).await.assert_status_ok();

    for i in 0..1500 {
        server
            .post("/agents/a4/logs")
            .json(&json!({"message": format!("m{i}")}))
            .await
            .assert_status_ok();
    }

    let response = server.get("/agents/a4/logs?limit=2000").await;
    response.assert_status_ok();
    let entries: Vec<LogEntry> = response.json();
    assert_eq!(entries.len(), 1000);
    assert_eq!(entries[0].message, "m1499");
    assert_eq!(entries[999].message, "m500");
    assert!(!entries.iter().any(|e| e.message == "m499"));
}

#[tokio::test]
async fn s5_slow_subscriber_isolation() {
    let server = server();
    server.post("/agents").json(&json!({"id": "a5"})).await.assert_status_ok();

    let mut fast = server.get_websocket("/ws?topics=all").await.into_websocket().await;
    let _welcome: ServerMessage = fast.receive_json().await;
    let mut slow = server.get_websocket("/ws?topics=all").await.into_websocket().await;
    let _welcome: ServerMessage = slow.receive_json().await;

    // max_subscriber_queue is 16; publish well past it without draining `slow`.
    for i in 0..200 {
        server
            .post("/agents/a5/logs")
            .json(&json!({"message": format!("n{i}")}))
            .await
            .assert_status_ok();
    }

    // `fast` must have kept receiving throughout.
    let mut received = 0;
    while tokio::time::timeout(Duration::from_millis(200), fast.receive_json::<ServerMessage>())
        .await
        .is_ok()
    {
        received += 1;
    }
    assert!(received > 0, "fast subscriber received nothing");

    let mut saw_overflow_or_close = false;
    while let Ok(message) =
        tokio::time::timeout(Duration::from_millis(200), slow.receive_json::<ServerMessage>()).await
    {
        if matches!(message, ServerMessage::Overflow | ServerMessage::Close { .. }) {
            saw_overflow_or_close = true;
        }
    }
    assert!(saw_overflow_or_close, "slow subscriber was never disconnected");
}

#[tokio::test]
async fn s6_retention_removes_completed_agent_past_ttl() {
    let state = Arc::new(AppState::new(Arc::new(config())));
    let server = TestServer::new(build_router(state.clone())).unwrap();

    let mut subscriber = server.get_websocket("/ws?topics=agent:a6").await.into_websocket().await;
    let _welcome: ServerMessage = subscriber.receive_json().await;

    server.post("/agents").json(&json!({"id": "a6"})).await.assert_status_ok();
    server
        .patch("/agents/a6/status")
        .json(&json!({"status": "complete"}))
        .await
        .assert_status_ok();

    // CompletedTtl=1s in `config()`; a retention sweep run directly rather
    // than waiting on the background worker's own interval (300s here).
    tokio::time::sleep(Duration::from_secs(2)).await;
    let worker = RetentionWorker::new(state.registry.clone(), Duration::from_secs(300), 1, 0);
    worker.sweep_once();

    server.get("/agents/a6").await.assert_status_not_found();

    let mut saw_tombstone = false;
    while let Ok(message) = tokio::time::timeout(
        Duration::from_millis(200),
        subscriber.receive_json::<ServerMessage>(),
    )
    .await
    {
        if matches!(message, ServerMessage::Tombstone { .. }) {
            saw_tombstone = true;
        }
    }
    assert!(saw_tombstone, "subscriber never received a tombstone");
}
