// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber WebSocket handler (§4.3/§4.5).
//!
//! A connection owns one [`crate::broadcaster::SubscriberHandle`]. Its event
//! loop multiplexes three sources: broadcast messages pulled off the
//! subscriber's own queue, a ping timer, and inbound client frames
//! (`subscribe`/`unsubscribe`/`pong`). A missed pong or a cancelled handle
//! (slow-consumer eviction) ends the connection.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::Instant;

use crate::model::Topic;
use crate::transport::ws_msg::{ClientMessage, ServerMessage};
use crate::transport::AppState;

/// Initial topic subscriptions, taken from the upgrade request's query
/// string so a client can subscribe before its first `subscribe` frame.
#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    #[serde(default)]
    pub topics: Option<String>,
}

impl WsQuery {
    fn initial_topics(&self) -> HashSet<Topic> {
        self.topics
            .as_deref()
            .unwrap_or("all")
            .split(',')
            .filter_map(Topic::parse)
            .collect()
    }
}

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(state, query.initial_topics(), socket))
}

async fn handle_connection(state: Arc<AppState>, topics: HashSet<Topic>, socket: WebSocket) {
    let mut handle = state.broadcaster.subscribe(topics);
    let (mut ws_tx, mut ws_rx) = socket.split();

    if send_json(&mut ws_tx, &ServerMessage::Welcome { subscriber_id: handle.id.clone() })
        .await
        .is_err()
    {
        state.broadcaster.close_handle(&handle.id);
        return;
    }

    let ping_interval = Duration::from_secs(state.config.ping_interval_secs.max(1));
    let pong_deadline = Duration::from_secs(state.config.pong_deadline_secs.max(1));
    let mut ping_timer = tokio::time::interval(ping_interval);
    let mut awaiting_pong = false;
    let mut pong_deadline_at = Instant::now();

    loop {
        tokio::select! {
            _ = handle.cancel.cancelled() => {
                let _ = send_json(&mut ws_tx, &ServerMessage::Close {
                    reason: "subscriber disconnected by server".to_string(),
                }).await;
                break;
            }

            message = handle.rx.recv() => {
                match message {
                    Some(message) => {
                        if send_json(&mut ws_tx, &message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            _ = ping_timer.tick() => {
                if awaiting_pong && Instant::now() >= pong_deadline_at {
                    break;
                }
                if send_json(&mut ws_tx, &ServerMessage::Ping).await.is_err() {
                    break;
                }
                awaiting_pong = true;
                pong_deadline_at = Instant::now() + pong_deadline;
            }

            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Subscribe { topics }) => {
                                let parsed: HashSet<Topic> = topics.iter().filter_map(|t| Topic::parse(t)).collect();
                                state.broadcaster.add_topics(&handle.id, parsed);
                            }
                            Ok(ClientMessage::Unsubscribe { topics }) => {
                                let parsed: HashSet<Topic> = topics.iter().filter_map(|t| Topic::parse(t)).collect();
                                state.broadcaster.remove_topics(&handle.id, &parsed);
                            }
                            Ok(ClientMessage::Pong) => {
                                awaiting_pong = false;
                            }
                            Err(_) => {
                                // Malformed client frame; ignored rather than
                                // tearing down an otherwise-healthy connection.
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.broadcaster.close_handle(&handle.id);
}

async fn send_json(
    tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string());
    tx.send(Message::Text(text.into())).await
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
