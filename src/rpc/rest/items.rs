//! Item resolution endpoints
//!
//! `GET /api/v1/items/{locator}` serves the adapted item;
//! `GET /api/v1/items/{locator}/manifest` exposes the hydrated internal
//! manifest for inspection. Both accept `?kind=` to assert the expected
//! item kind. Every pipeline error maps to exactly one status code and a
//! structured body; internal error text never leaks beyond the typed
//! message.

use std::str::FromStr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};
use tracing::warn;

use crate::registry::{ItemKind, Locator, RegistryError, RegistryService};

use super::types::{error_response, immutable_response, success_response};

/// Handle a request under `/api/v1/items`
pub async fn handle_item_request(
    service: &RegistryService,
    path: &str,
    query: Option<&str>,
    request_id: String,
) -> Response<Full<Bytes>> {
    // Expected: /api/v1/items/{locator} or /api/v1/items/{locator}/manifest
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (raw_locator, manifest_view) = match (parts.get(3), parts.get(4), parts.len()) {
        (Some(raw), None, 4) => (*raw, false),
        (Some(raw), Some(&"manifest"), 5) => (*raw, true),
        _ => {
            return error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Endpoint not found: {path}"),
                None,
                request_id,
            );
        }
    };

    let locator = match Locator::parse(raw_locator) {
        Ok(locator) => locator,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "INVALID_LOCATOR",
                &err.to_string(),
                None,
                request_id,
            );
        }
    };

    let expected_kind = match expected_kind_param(query) {
        Ok(kind) => kind,
        Err(message) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "INVALID_KIND",
                &message,
                None,
                request_id,
            );
        }
    };

    if manifest_view {
        match service.resolve_manifest(&locator, expected_kind).await {
            Ok(manifest) => match serde_json::to_value(&manifest) {
                Ok(data) => success_response(data, request_id),
                Err(e) => internal_error(&e.to_string(), request_id),
            },
            Err(err) => registry_error_response(&err, request_id),
        }
    } else {
        match service.resolve_item(&locator, expected_kind).await {
            Ok(item) => match serde_json::to_value(&item) {
                Ok(data) => immutable_response(data, request_id),
                Err(e) => internal_error(&e.to_string(), request_id),
            },
            Err(err) => registry_error_response(&err, request_id),
        }
    }
}

/// Parse the `kind` query parameter, if present
fn expected_kind_param(query: Option<&str>) -> Result<Option<ItemKind>, String> {
    let Some(query) = query else {
        return Ok(None);
    };
    let Some(raw) = query
        .split('&')
        .find(|p| p.starts_with("kind="))
        .and_then(|p| p.split('=').nth(1))
    else {
        return Ok(None);
    };
    ItemKind::from_str(raw).map(Some)
}

/// Map a pipeline failure to its response
pub fn registry_error_response(
    err: &RegistryError,
    request_id: String,
) -> Response<Full<Bytes>> {
    let (status, code) = status_for_error(err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!("resolution failed ({}): {}", code, err);
    }
    error_response(status, code, &err.to_string(), error_details(err), request_id)
}

/// Status code and machine-readable tag for each failure class
pub fn status_for_error(err: &RegistryError) -> (StatusCode, &'static str) {
    match err {
        RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        RegistryError::InvalidLocator(_) => (StatusCode::BAD_REQUEST, "INVALID_LOCATOR"),
        RegistryError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        RegistryError::KindMismatch { .. } => (StatusCode::BAD_REQUEST, "KIND_MISMATCH"),
        RegistryError::UpstreamUnavailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_UNAVAILABLE")
        }
        RegistryError::UpstreamTimeout(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_TIMEOUT")
        }
        RegistryError::CyclicReference(_) | RegistryError::DepthExceeded(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "RESOLUTION_ERROR")
        }
        RegistryError::Resolution { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "RESOLUTION_ERROR")
        }
        RegistryError::Hydration { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "HYDRATION_ERROR"),
    }
}

/// Structured context attached to the error body
pub fn error_details(err: &RegistryError) -> Option<Value> {
    match err {
        RegistryError::Validation(fields) => serde_json::to_value(fields)
            .ok()
            .map(|fields| json!({ "fields": fields })),
        RegistryError::KindMismatch { expected, actual } => Some(json!({
            "expected": expected.as_str(),
            "actual": actual.as_str(),
        })),
        _ => None,
    }
}

fn internal_error(message: &str, request_id: String) -> Response<Full<Bytes>> {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        message,
        None,
        request_id,
    )
}
