// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet monitoring hub for interactive AI coding agent sessions.
//!
//! Hook scripts running alongside each agent session POST lifecycle and
//! tool-invocation events to [`transport::build_router`]'s ingestion endpoint;
//! this crate maintains the resulting agent state in [`registry::AgentRegistry`]
//! and fans updates out to dashboard clients over the WebSocket protocol in
//! [`transport::ws`].

pub mod broadcaster;
pub mod config;
pub mod error;
pub mod event;
mod lockext;
pub mod model;
pub mod registry;
pub mod retention;
pub mod router;
pub mod run;
pub mod sanitize;
pub mod state_machine;
pub mod transport;
