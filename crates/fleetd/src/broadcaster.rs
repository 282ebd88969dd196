// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic-based fanout with per-subscriber bounded queues and a
//! drop-and-disconnect slow-consumer policy.
//!
//! Each subscriber owns a bounded `mpsc` channel and a `CancellationToken`;
//! `publish` only enqueues (a non-blocking `try_send`) and never awaits, so a
//! stalled connection can never delay the publisher or any other
//! subscriber. The subscriber-set map itself is guarded by a short-held
//! [`RwLock`] covering only add/remove/topic-edit; `publish` walks a read
//! guard and drops it before touching any individual queue's contents
//! beyond the non-blocking send.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::Topic;
use crate::transport::ws_msg::ServerMessage;

struct SubscriberEntry {
    topics: HashSet<Topic>,
    tx: mpsc::Sender<ServerMessage>,
    cancel: CancellationToken,
}

/// A live subscriber's half of the channel, handed to the WebSocket
/// connection handler after [`Broadcaster::subscribe`].
pub struct SubscriberHandle {
    pub id: String,
    pub rx: mpsc::Receiver<ServerMessage>,
    pub cancel: CancellationToken,
}

pub struct Broadcaster {
    subscribers: RwLock<HashMap<String, SubscriberEntry>>,
    max_queue: usize,
}

impl Broadcaster {
    pub fn new(max_queue: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            max_queue,
        }
    }

    pub fn subscribe(&self, topics: HashSet<Topic>) -> SubscriberHandle {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(self.max_queue);
        let cancel = CancellationToken::new();
        let entry = SubscriberEntry {
            topics,
            tx,
            cancel: cancel.clone(),
        };
        crate::lockext::write(&self.subscribers).insert(id.clone(), entry);
        SubscriberHandle { id, rx, cancel }
    }

    pub fn add_topics(&self, id: &str, topics: HashSet<Topic>) {
        if let Some(entry) = crate::lockext::write(&self.subscribers).get_mut(id) {
            entry.topics.extend(topics);
        }
    }

    pub fn remove_topics(&self, id: &str, topics: &HashSet<Topic>) {
        if let Some(entry) = crate::lockext::write(&self.subscribers).get_mut(id) {
            entry.topics.retain(|t| !topics.contains(t));
        }
    }

    /// Drop the subscriber entirely. Idempotent.
    pub fn close_handle(&self, id: &str) {
        let removed = crate::lockext::write(&self.subscribers).remove(id);
        if let Some(entry) = removed {
            entry.cancel.cancel();
        }
    }

    /// Non-blocking publish to every subscriber of `topic`. Slow consumers
    /// (a full queue) are disconnected; closed consumers are pruned. Neither
    /// case affects delivery to any other subscriber.
    pub fn publish(&self, topic: &Topic, message: ServerMessage) {
        let mut to_drop = Vec::new();
        {
            let subscribers = crate::lockext::read(&self.subscribers);
            for (id, entry) in subscribers.iter() {
                if !entry.topics.contains(topic) {
                    continue;
                }
                match entry.tx.try_send(message.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // Best-effort: the queue is full, so this will
                        // usually fail too, but it costs nothing to try.
                        let _ = entry.tx.try_send(ServerMessage::Overflow);
                        entry.cancel.cancel();
                        to_drop.push(id.clone());
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        to_drop.push(id.clone());
                    }
                }
            }
        }
        if !to_drop.is_empty() {
            let mut subscribers = crate::lockext::write(&self.subscribers);
            for id in to_drop {
                subscribers.remove(&id);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        crate::lockext::read(&self.subscribers).len()
    }
}

#[cfg(test)]
#[path = "broadcaster_tests.rs"]
mod tests;
