// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn validation_maps_to_400() {
    assert_eq!(
        AppError::Validation("bad".into()).http_status(),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn not_found_maps_to_404() {
    assert_eq!(
        AppError::NotFound("a1".into()).http_status(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn invalid_transition_maps_to_400() {
    assert_eq!(
        AppError::InvalidTransition("complete->active".into()).http_status(),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn transient_maps_to_503() {
    assert_eq!(
        AppError::Transient("store unreachable".into()).http_status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[test]
fn fatal_maps_to_500() {
    assert_eq!(
        AppError::Fatal("invariant violated".into()).http_status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn display_includes_code_and_message() {
    let err = AppError::NotFound("a1".into());
    assert_eq!(err.to_string(), "NOT_FOUND: a1");
}
