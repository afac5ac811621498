//! Node status endpoint

use std::time::Instant;

use serde_json::{json, Value};

use crate::registry::RegistryService;

/// Build the status document: version, uptime, cache usage
pub fn node_status(service: &RegistryService, started_at: Instant) -> Value {
    let cache = service
        .cache_stats()
        .and_then(|stats| serde_json::to_value(stats).ok())
        .unwrap_or(Value::Null);

    json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": started_at.elapsed().as_secs(),
        "cache": cache,
    })
}
