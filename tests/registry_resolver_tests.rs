//! Tests for inline reference scanning and resolution

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use registry_node::registry::{
    has_references, DocumentFetcher, FetchedDocument, Locator, ReferenceResolver, RegistryError,
};
use serde_json::json;

// Helper: in-memory content store with per-locator fetch counters
struct MockFetcher {
    docs: HashMap<String, FetchedDocument>,
    fetch_counts: Mutex<HashMap<String, usize>>,
}

impl MockFetcher {
    fn new() -> Self {
        Self {
            docs: HashMap::new(),
            fetch_counts: Mutex::new(HashMap::new()),
        }
    }

    fn with_text(mut self, locator: &str, text: &str) -> Self {
        self.docs
            .insert(locator.to_string(), FetchedDocument::Text(text.to_string()));
        self
    }

    fn with_json(mut self, locator: &str, value: serde_json::Value) -> Self {
        self.docs
            .insert(locator.to_string(), FetchedDocument::Json(value));
        self
    }

    fn fetches(&self, locator: &str) -> usize {
        *self.fetch_counts.lock().unwrap().get(locator).unwrap_or(&0)
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<FetchedDocument, RegistryError> {
        let key = locator.to_string();
        *self
            .fetch_counts
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_insert(0) += 1;
        self.docs
            .get(&key)
            .cloned()
            .ok_or(RegistryError::NotFound(key))
    }
}

fn resolver(fetcher: &Arc<MockFetcher>, max_depth: usize) -> ReferenceResolver {
    ReferenceResolver::new(Arc::clone(fetcher) as Arc<dyn DocumentFetcher>, max_depth)
}

fn locator(s: &str) -> Locator {
    Locator::parse(s).unwrap()
}

// ===== Scanner =====

#[test]
fn test_scanner_finds_nested_placeholder() {
    let doc = json!({
        "name": "x",
        "meta": { "palette": ["light", "{{vout:4}}"] }
    });
    assert!(has_references(&doc));
}

#[test]
fn test_scanner_negative_on_clean_manifest() {
    let doc = json!({
        "name": "x",
        "files": [{ "path": "a.tsx", "content": "export const A = 1" }]
    });
    assert!(!has_references(&doc));
}

#[test]
fn test_scanner_ignores_similar_but_invalid_markers() {
    assert!(!has_references(&json!({ "a": "{{vout}}" })));
    assert!(!has_references(&json!({ "a": "{vout:1}" })));
    assert!(!has_references(&json!({ "a": "vout:1" })));
}

// ===== Substitution =====

#[tokio::test]
async fn test_substitutes_sibling_text() {
    let fetcher = Arc::new(MockFetcher::new().with_text("tx1:1", "dark"));
    let doc = json!({ "theme": "{{vout:1}}" });

    let resolved = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap();
    assert_eq!(resolved, json!({ "theme": "dark" }));
}

#[tokio::test]
async fn test_substitution_is_textual_within_string() {
    let fetcher = Arc::new(MockFetcher::new().with_text("tx1:1", "zinc"));
    let doc = json!({ "css": "color: {{vout:1}}; background: {{vout:1}}" });

    let resolved = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap();
    assert_eq!(
        resolved,
        json!({ "css": "color: zinc; background: zinc" })
    );
}

#[tokio::test]
async fn test_structured_sibling_is_serialized() {
    let fetcher = Arc::new(MockFetcher::new().with_json("tx1:2", json!({ "radius": 4 })));
    let doc = json!({ "tokens": "{{vout:2}}" });

    let resolved = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap();
    assert_eq!(resolved, json!({ "tokens": r#"{"radius":4}"# }));
}

#[tokio::test]
async fn test_sibling_derived_from_current_transaction() {
    // Same placeholder, different transaction: resolves against its own tx
    let fetcher = Arc::new(
        MockFetcher::new()
            .with_text("tx1:1", "from-tx1")
            .with_text("tx2:1", "from-tx2"),
    );
    let doc = json!({ "v": "{{vout:1}}" });
    let r = resolver(&fetcher, 8);

    let from_tx1 = r.resolve(&doc, &locator("tx1:0")).await.unwrap();
    let from_tx2 = r.resolve(&doc, &locator("tx2:0")).await.unwrap();
    assert_eq!(from_tx1, json!({ "v": "from-tx1" }));
    assert_eq!(from_tx2, json!({ "v": "from-tx2" }));
}

#[tokio::test]
async fn test_no_references_is_identity() {
    let fetcher = Arc::new(MockFetcher::new());
    let doc = json!({
        "kind": "component",
        "name": "plain",
        "files": [{ "path": "a.tsx", "content": "no markers here" }],
        "meta": { "n": 3, "flag": true, "nothing": null }
    });

    assert!(!has_references(&doc));
    let resolved = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap();
    assert_eq!(resolved, doc);
}

// ===== Memoization =====

#[tokio::test]
async fn test_repeated_placeholder_fetches_once() {
    let fetcher = Arc::new(MockFetcher::new().with_text("tx1:1", "shared"));
    let doc = json!({
        "a": "{{vout:1}}",
        "b": "{{vout:1}}",
        "c": ["{{vout:1}}", "{{vout:1}}"]
    });

    let resolved = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap();
    assert_eq!(
        resolved,
        json!({ "a": "shared", "b": "shared", "c": ["shared", "shared"] })
    );
    assert_eq!(fetcher.fetches("tx1:1"), 1);
}

// ===== Nested references =====

#[tokio::test]
async fn test_transitive_resolution() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .with_text("tx1:1", "wrapped({{vout:2}})")
            .with_text("tx1:2", "inner"),
    );
    let doc = json!({ "v": "{{vout:1}}" });

    let resolved = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap();
    assert_eq!(resolved, json!({ "v": "wrapped(inner)" }));
}

#[tokio::test]
async fn test_depth_limit_enforced() {
    // 0 → 1 → 2 → 3 with max depth 2: the third hop must fail
    let fetcher = Arc::new(
        MockFetcher::new()
            .with_text("tx1:1", "{{vout:2}}")
            .with_text("tx1:2", "{{vout:3}}")
            .with_text("tx1:3", "leaf"),
    );
    let doc = json!({ "v": "{{vout:1}}" });

    let err = resolver(&fetcher, 2)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::DepthExceeded(2)));
}

#[tokio::test]
async fn test_deep_chain_within_limit_resolves() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .with_text("tx1:1", "{{vout:2}}")
            .with_text("tx1:2", "{{vout:3}}")
            .with_text("tx1:3", "leaf"),
    );
    let doc = json!({ "v": "{{vout:1}}" });

    let resolved = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap();
    assert_eq!(resolved, json!({ "v": "leaf" }));
}

// ===== Cycles =====

#[tokio::test]
async fn test_direct_cycle_back_to_origin() {
    // tx1:0's placeholder points at tx1:1, whose content points back at tx1:0
    let fetcher = Arc::new(MockFetcher::new().with_text("tx1:1", "{{vout:0}}"));
    let doc = json!({ "v": "{{vout:1}}" });

    let err = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::CyclicReference(_)));
}

#[tokio::test]
async fn test_mutual_sibling_cycle() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .with_text("tx1:1", "{{vout:2}}")
            .with_text("tx1:2", "{{vout:1}}"),
    );
    let doc = json!({ "v": "{{vout:1}}" });

    let err = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::CyclicReference(_)));
}

#[tokio::test]
async fn test_self_reference_rejected() {
    let fetcher = Arc::new(MockFetcher::new());
    let doc = json!({ "v": "{{vout:0}}" });

    let err = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::CyclicReference(_)));
}

// ===== Failure policy =====

#[tokio::test]
async fn test_missing_sibling_fails_whole_resolution() {
    let fetcher = Arc::new(MockFetcher::new().with_text("tx1:1", "ok"));
    let doc = json!({ "a": "{{vout:1}}", "b": "{{vout:9}}" });

    let err = resolver(&fetcher, 8)
        .resolve(&doc, &locator("tx1:0"))
        .await
        .unwrap_err();
    match err {
        RegistryError::Resolution { locator, .. } => assert_eq!(locator, "tx1:9"),
        other => panic!("expected resolution error, got {other:?}"),
    }
}
