// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, ValueEnum};

/// Fleet monitoring hub for interactive AI coding agent sessions.
#[derive(Debug, Parser)]
#[command(name = "fleetd", version, about)]
pub struct Config {
    /// Address to bind the HTTP/WebSocket listener to.
    #[arg(long, env = "FLEETD_LISTEN_ADDRESS", default_value = ":3001")]
    pub listen_address: String,

    /// Maximum number of log entries retained per agent (ring buffer capacity).
    #[arg(long, env = "FLEETD_MAX_LOGS_PER_AGENT", default_value = "1000")]
    pub max_logs_per_agent: usize,

    /// Maximum number of pending messages buffered per subscriber before
    /// drop-and-disconnect.
    #[arg(long, env = "FLEETD_MAX_SUBSCRIBER_QUEUE", default_value = "256")]
    pub max_subscriber_queue: usize,

    /// Interval in seconds between server-initiated WebSocket pings.
    #[arg(long, env = "FLEETD_PING_INTERVAL_SECS", default_value = "30")]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a Pong before disconnecting a subscriber.
    #[arg(long, env = "FLEETD_PONG_DEADLINE_SECS", default_value = "10")]
    pub pong_deadline_secs: u64,

    /// Deadline in seconds for a single ingestion request.
    #[arg(long, env = "FLEETD_INGESTION_DEADLINE_SECS", default_value = "5")]
    pub ingestion_deadline_secs: u64,

    /// Seconds after entering Complete before an agent is retired.
    #[arg(long, env = "FLEETD_COMPLETED_TTL_SECS", default_value = "86400")]
    pub completed_ttl_secs: u64,

    /// Seconds of inactivity before an agent is retired regardless of status
    /// (0 disables idle expiration).
    #[arg(long, env = "FLEETD_IDLE_TTL_SECS", default_value = "604800")]
    pub idle_ttl_secs: u64,

    /// Interval in seconds between retention sweeps.
    #[arg(long, env = "FLEETD_RETENTION_INTERVAL_SECS", default_value = "300")]
    pub retention_interval_secs: u64,

    /// Maximum length of a sanitized string value before truncation.
    #[arg(long, env = "FLEETD_MAX_STRING_LEN", default_value = "4096")]
    pub max_string_len: usize,

    /// Maximum recursion depth when sanitizing nested maps.
    #[arg(long, env = "FLEETD_MAX_SANITIZE_DEPTH", default_value = "8")]
    pub max_sanitize_depth: usize,

    /// Persistence backend for agent state.
    #[arg(long, env = "FLEETD_STORE_BACKEND", default_value = "memory")]
    pub store_backend: StoreBackend,

    /// Connection string for the external-kv store backend.
    #[arg(long, env = "FLEETD_STORE_URI")]
    pub store_uri: Option<String>,

    /// Log format (json or text).
    #[arg(long, env = "FLEETD_LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "FLEETD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Pluggable persistence backend for [`crate::registry::AgentRegistry`].
///
/// Only `Memory` is implemented by this crate; `ExternalKv` is accepted at
/// the configuration layer so a deployment can fail fast with a clear message
/// rather than silently falling back, but no concrete KV integration ships
/// here (storage backend selection is explicitly out of scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum StoreBackend {
    Memory,
    ExternalKv,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store_backend == StoreBackend::ExternalKv && self.store_uri.is_none() {
            anyhow::bail!("--store-uri is required when --store-backend=external-kv");
        }
        if self.store_backend == StoreBackend::ExternalKv {
            anyhow::bail!(
                "store backend 'external-kv' is not implemented by this build; use 'memory'"
            );
        }
        if self.max_logs_per_agent == 0 {
            anyhow::bail!("--max-logs-per-agent must be at least 1");
        }
        if self.max_subscriber_queue == 0 {
            anyhow::bail!("--max-subscriber-queue must be at least 1");
        }
        Ok(())
    }

    /// Whether idle-agent expiration is enabled.
    pub fn idle_expiration_enabled(&self) -> bool {
        self.idle_ttl_secs > 0
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
