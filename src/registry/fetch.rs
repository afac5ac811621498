//! Document fetching from the content store
//!
//! The fetcher is the only network boundary in the resolution pipeline.
//! Documents are retrieved with `GET {base}/{locator}`; 404 means the
//! locator was never inscribed and is never retried, while transport
//! failures and 5xx responses are retried with exponential backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::registry::cache::DocumentCache;
use crate::registry::error::RegistryError;
use crate::registry::locator::Locator;

/// Backoff ceiling between retry attempts
const MAX_BACKOFF_MILLIS: u64 = 10_000;

/// Raw payload retrieved for a locator
///
/// The store serves either JSON documents or raw text; nothing is known
/// about the content until it passes validation.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedDocument {
    Json(Value),
    Text(String),
}

impl FetchedDocument {
    /// JSON view of the document, if it is one
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FetchedDocument::Json(value) => Some(value),
            FetchedDocument::Text(_) => None,
        }
    }

    /// Textual form used when substituting this document into a string
    /// field: raw text verbatim, JSON strings by their inner value,
    /// structured JSON serialized.
    pub fn substitution_text(&self) -> String {
        match self {
            FetchedDocument::Text(text) => text.clone(),
            FetchedDocument::Json(Value::String(s)) => s.clone(),
            FetchedDocument::Json(value) => value.to_string(),
        }
    }
}

/// Retrieves raw documents by locator
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, locator: &Locator) -> Result<FetchedDocument, RegistryError>;
}

/// Run `op` up to `max_attempts` times, sleeping between attempts with
/// exponential backoff. Only transient errors are retried; permanent
/// failures (not found, validation) surface immediately.
pub async fn with_retry<F, Fut, T>(
    max_attempts: u32,
    initial_backoff_millis: u64,
    mut op: F,
) -> Result<T, RegistryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RegistryError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(err);
                }
                // 200ms, 400ms, 800ms, ... capped
                let backoff = initial_backoff_millis
                    .saturating_mul(1u64 << (attempt - 1))
                    .min(MAX_BACKOFF_MILLIS);
                warn!(
                    "transient upstream failure (attempt {}/{}): {}; retrying in {}ms",
                    attempt, max_attempts, err, backoff
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// HTTP client for the content store, with read-through caching
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    initial_backoff_millis: u64,
    cache: Option<Arc<DocumentCache>>,
}

impl HttpDocumentFetcher {
    /// Create a fetcher from the upstream configuration
    pub fn new(config: &UpstreamConfig, cache: Option<Arc<DocumentCache>>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_fetch_attempts,
            initial_backoff_millis: config.initial_backoff_millis,
            cache,
        })
    }

    async fn fetch_once(&self, locator: &Locator) -> Result<FetchedDocument, RegistryError> {
        let url = format!("{}/{}", self.base_url, locator);
        debug!("fetching document {} from {}", locator, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            RegistryError::UpstreamUnavailable(format!("request to {url} failed: {e}"))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(locator.to_string()));
        }
        if !status.is_success() {
            return Err(RegistryError::UpstreamUnavailable(format!(
                "upstream returned {status} for {locator}"
            )));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false);

        let body = response.bytes().await.map_err(|e| {
            RegistryError::UpstreamUnavailable(format!("failed to read body for {locator}: {e}"))
        })?;

        Ok(classify_payload(&body, is_json))
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<FetchedDocument, RegistryError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(locator) {
                debug!("document {} served from cache", locator);
                return Ok((*cached).clone());
            }
        }

        let document = with_retry(self.max_attempts, self.initial_backoff_millis, || {
            self.fetch_once(locator)
        })
        .await?;

        if let Some(cache) = &self.cache {
            cache.put(locator.clone(), document.clone());
        }
        Ok(document)
    }
}

/// Classify an upstream payload as JSON or raw text.
///
/// Content type wins when declared; otherwise a parse attempt decides.
/// Anything that is not valid JSON is raw text.
fn classify_payload(body: &[u8], content_type_json: bool) -> FetchedDocument {
    if content_type_json {
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            return FetchedDocument::Json(value);
        }
    }
    let text = String::from_utf8_lossy(body).into_owned();
    if !content_type_json {
        if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
            return FetchedDocument::Json(value);
        }
    }
    FetchedDocument::Text(text)
}
