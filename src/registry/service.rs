//! Resolution pipeline orchestration
//!
//! One request moves a document through
//! fetch → validate → (scan) → resolve → hydrate → adapt, short-circuiting
//! on the first typed failure. The whole pipeline runs under a single
//! request-scoped timeout; expiry aborts in-flight fetches rather than
//! returning a partial item.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::NodeConfig;
use crate::registry::adapter::{adapt, AdaptedItem};
use crate::registry::cache::{CacheStats, DocumentCache};
use crate::registry::error::RegistryError;
use crate::registry::fetch::{DocumentFetcher, HttpDocumentFetcher};
use crate::registry::hydrator::ManifestHydrator;
use crate::registry::locator::Locator;
use crate::registry::manifest::{self, ItemKind, Manifest};
use crate::registry::resolver::{has_references, ReferenceResolver};

/// Resolves registry items end to end
pub struct RegistryService {
    fetcher: Arc<dyn DocumentFetcher>,
    resolver: ReferenceResolver,
    hydrator: ManifestHydrator,
    request_timeout: Duration,
    cache: Option<Arc<DocumentCache>>,
}

impl RegistryService {
    /// Build the production service: HTTP fetcher plus optional cache
    pub fn new(config: &NodeConfig) -> anyhow::Result<Self> {
        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(DocumentCache::new(config.cache.capacity)));
        let fetcher: Arc<dyn DocumentFetcher> =
            Arc::new(HttpDocumentFetcher::new(&config.upstream, cache.clone())?);
        Ok(Self::assemble(config, fetcher, cache))
    }

    /// Build the service around an arbitrary fetcher (used by tests)
    pub fn with_fetcher(config: &NodeConfig, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self::assemble(config, fetcher, None)
    }

    fn assemble(
        config: &NodeConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        cache: Option<Arc<DocumentCache>>,
    ) -> Self {
        let resolver = ReferenceResolver::new(
            Arc::clone(&fetcher),
            config.resolver.max_reference_depth,
        );
        let hydrator = ManifestHydrator::new(
            Arc::clone(&fetcher),
            resolver.clone(),
            config.hydrator.max_concurrent_fetches,
        );
        Self {
            fetcher,
            resolver,
            hydrator,
            request_timeout: Duration::from_secs(config.server.request_timeout_seconds),
            cache,
        }
    }

    /// Resolve a locator into an adapted, installer-ready item
    pub async fn resolve_item(
        &self,
        locator: &Locator,
        expected_kind: Option<ItemKind>,
    ) -> Result<AdaptedItem, RegistryError> {
        let manifest = self.resolve_manifest(locator, expected_kind).await?;
        Ok(adapt(manifest))
    }

    /// Resolve a locator into the hydrated internal manifest
    pub async fn resolve_manifest(
        &self,
        locator: &Locator,
        expected_kind: Option<ItemKind>,
    ) -> Result<Manifest, RegistryError> {
        let timeout = self.request_timeout;
        tokio::time::timeout(timeout, self.resolve_manifest_inner(locator, expected_kind))
            .await
            .map_err(|_| RegistryError::UpstreamTimeout(timeout.as_secs()))?
    }

    async fn resolve_manifest_inner(
        &self,
        locator: &Locator,
        expected_kind: Option<ItemKind>,
    ) -> Result<Manifest, RegistryError> {
        let document = self.fetcher.fetch(locator).await?;
        let manifest = manifest::validate(&document, expected_kind)?;

        // Fast path: no placeholders anywhere, resolution is the identity.
        let raw = document.as_json().ok_or_else(|| RegistryError::Resolution {
            locator: locator.to_string(),
            reason: "validated document is not JSON".to_string(),
        })?;
        let manifest = if has_references(raw) {
            debug!("manifest {} contains inline references", locator);
            let resolved = self.resolver.resolve(raw, locator).await?;
            manifest::validate_value(&resolved, expected_kind)?
        } else {
            manifest
        };

        let hydrated = self.hydrator.hydrate(manifest).await?;
        debug!(
            "resolved {} ({} file{})",
            locator,
            hydrated.files.len(),
            if hydrated.files.len() == 1 { "" } else { "s" }
        );
        Ok(hydrated)
    }

    /// Document cache usage counters, when a cache is configured
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }
}
