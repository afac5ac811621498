//! Tests for REST item endpoints (routing, error mapping, envelopes)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode};
use registry_node::config::NodeConfig;
use registry_node::registry::{
    DocumentFetcher, FetchedDocument, ItemKind, Locator, RegistryError, RegistryService,
};
use registry_node::rpc::rest::items::{
    error_details, handle_item_request, status_for_error,
};
use serde_json::{json, Value};

// Helper: in-memory content store
struct MockFetcher {
    docs: HashMap<String, FetchedDocument>,
}

impl MockFetcher {
    fn new() -> Self {
        Self {
            docs: HashMap::new(),
        }
    }

    fn with_json(mut self, locator: &str, value: Value) -> Self {
        self.docs
            .insert(locator.to_string(), FetchedDocument::Json(value));
        self
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<FetchedDocument, RegistryError> {
        let key = locator.to_string();
        self.docs
            .get(&key)
            .cloned()
            .ok_or(RegistryError::NotFound(key))
    }
}

fn service_with_badge() -> RegistryService {
    let fetcher = Arc::new(MockFetcher::new().with_json(
        "tx1:0",
        json!({
            "kind": "component",
            "name": "badge",
            "files": [{ "path": "badge.tsx", "content": "export const B=1" }]
        }),
    ));
    RegistryService::with_fetcher(&NodeConfig::default(), fetcher)
}

async fn body_json(response: Response<Full<Bytes>>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ===== Item endpoint =====

#[tokio::test]
async fn test_get_item_success_envelope() {
    let service = service_with_badge();
    let response =
        handle_item_request(&service, "/api/v1/items/tx1:0", None, "req-1".to_string()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("Cache-Control")
            .and_then(|v| v.to_str().ok()),
        Some("public, max-age=31536000, immutable")
    );
    assert!(response.headers().get("ETag").is_some());

    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "badge");
    assert_eq!(body["data"]["type"], "registry:component");
    assert_eq!(body["meta"]["request_id"], "req-1");
}

#[tokio::test]
async fn test_get_item_with_matching_kind() {
    let service = service_with_badge();
    let response = handle_item_request(
        &service,
        "/api/v1/items/tx1:0",
        Some("kind=component"),
        "req-2".to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_item_kind_mismatch_is_400_with_details() {
    let service = service_with_badge();
    let response = handle_item_request(
        &service,
        "/api/v1/items/tx1:0",
        Some("kind=block"),
        "req-3".to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "KIND_MISMATCH");
    assert_eq!(body["error"]["details"]["expected"], "block");
    assert_eq!(body["error"]["details"]["actual"], "component");
}

#[tokio::test]
async fn test_get_item_unknown_kind_param_is_400() {
    let service = service_with_badge();
    let response = handle_item_request(
        &service,
        "/api/v1/items/tx1:0",
        Some("kind=gadget"),
        "req-4".to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_KIND");
}

#[tokio::test]
async fn test_get_missing_item_is_404() {
    let service = service_with_badge();
    let response =
        handle_item_request(&service, "/api/v1/items/tx9:0", None, "req-5".to_string()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_item_bad_locator_is_400() {
    let service = service_with_badge();
    let response = handle_item_request(
        &service,
        "/api/v1/items/not-a-locator",
        None,
        "req-6".to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_LOCATOR");
}

#[tokio::test]
async fn test_unknown_subpath_is_404() {
    let service = service_with_badge();
    let response = handle_item_request(
        &service,
        "/api/v1/items/tx1:0/raw",
        None,
        "req-7".to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ===== Manifest view =====

#[tokio::test]
async fn test_manifest_view_returns_internal_shape() {
    let service = service_with_badge();
    let response = handle_item_request(
        &service,
        "/api/v1/items/tx1:0/manifest",
        None,
        "req-8".to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["kind"], "component");
    assert_eq!(body["data"]["name"], "badge");
    // Internal shape, not the consumer schema
    assert!(body["data"].get("$schema").is_none());
}

// ===== Error mapping table =====

#[test]
fn test_status_mapping_covers_taxonomy() {
    let cases: Vec<(RegistryError, StatusCode, &str)> = vec![
        (
            RegistryError::NotFound("tx1:0".into()),
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
        ),
        (
            RegistryError::InvalidLocator("x".into()),
            StatusCode::BAD_REQUEST,
            "INVALID_LOCATOR",
        ),
        (
            RegistryError::Validation(vec![]),
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
        ),
        (
            RegistryError::KindMismatch {
                expected: ItemKind::Block,
                actual: ItemKind::Component,
            },
            StatusCode::BAD_REQUEST,
            "KIND_MISMATCH",
        ),
        (
            RegistryError::UpstreamUnavailable("down".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "UPSTREAM_UNAVAILABLE",
        ),
        (
            RegistryError::UpstreamTimeout(30),
            StatusCode::INTERNAL_SERVER_ERROR,
            "UPSTREAM_TIMEOUT",
        ),
        (
            RegistryError::CyclicReference("tx1:1".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "RESOLUTION_ERROR",
        ),
        (
            RegistryError::DepthExceeded(8),
            StatusCode::INTERNAL_SERVER_ERROR,
            "RESOLUTION_ERROR",
        ),
        (
            RegistryError::Resolution {
                locator: "tx1:1".into(),
                reason: "gone".into(),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
            "RESOLUTION_ERROR",
        ),
        (
            RegistryError::Hydration {
                path: "a.tsx".into(),
                reason: "gone".into(),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
            "HYDRATION_ERROR",
        ),
    ];

    for (err, status, code) in cases {
        assert_eq!(status_for_error(&err), (status, code), "for {err:?}");
    }
}

#[test]
fn test_validation_details_carry_field_paths() {
    let err = RegistryError::Validation(vec![registry_node::registry::FieldError::new(
        "files[0].path",
        "must not be empty",
    )]);
    let details = error_details(&err).unwrap();
    assert_eq!(details["fields"][0]["path"], "files[0].path");
    assert_eq!(details["fields"][0]["reason"], "must not be empty");
}
