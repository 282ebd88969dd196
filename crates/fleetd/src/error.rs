// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Unified error taxonomy shared across the ingestion, query, and subscriber
/// surfaces.
///
/// `SlowConsumer` is deliberately absent: it is handled entirely inside the
/// broadcaster via drop-and-disconnect and never escapes into a handler
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "message")]
pub enum AppError {
    /// Malformed envelope or out-of-range enum value; never mutates state.
    Validation(String),
    /// Agent missing on a read.
    NotFound(String),
    /// State machine rejected an explicit status change.
    InvalidTransition(String),
    /// Store backend failure or timeout; in-memory state remains authoritative.
    Transient(String),
    /// Unrecoverable internal invariant violation.
    Fatal(String),
}

impl AppError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Transient(_) => "TRANSIENT",
            Self::Fatal(_) => "FATAL",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::NotFound(m)
            | Self::InvalidTransition(m)
            | Self::Transient(m)
            | Self::Fatal(m) => m,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.message())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = json!({
            "error": self.as_str(),
            "message": self.message(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
