//! Manifest hydration
//!
//! Multi-file manifests may store file contents in sibling documents
//! instead of inline. Hydration fetches every referenced document and
//! assigns its content to the owning file entry. Fetches for independent
//! entries run concurrently under a bounded fan-out; results are written
//! into a pre-sized slot vector indexed by original position, so the
//! served file order never depends on completion order. A single failed
//! fetch fails the whole manifest: the installer client expects a
//! complete set or nothing.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::registry::error::RegistryError;
use crate::registry::fetch::DocumentFetcher;
use crate::registry::locator::Locator;
use crate::registry::manifest::{FileEntry, Manifest};
use crate::registry::resolver::{has_references, ReferenceResolver};

/// Fetches and inlines externally-stored file contents
pub struct ManifestHydrator {
    fetcher: Arc<dyn DocumentFetcher>,
    resolver: ReferenceResolver,
    max_concurrent: usize,
}

impl ManifestHydrator {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        resolver: ReferenceResolver,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Hydrate every reference entry of `manifest`; embedded entries pass
    /// through unchanged.
    pub async fn hydrate(&self, manifest: Manifest) -> Result<Manifest, RegistryError> {
        let Manifest {
            kind,
            name,
            files,
            meta,
        } = manifest;

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut slots: Vec<Option<FileEntry>> = Vec::with_capacity(files.len());
        let mut tasks = Vec::new();

        for (index, entry) in files.into_iter().enumerate() {
            match entry.source_locator.clone() {
                None => slots.push(Some(entry)),
                Some(source) => {
                    slots.push(None);
                    let fetcher = Arc::clone(&self.fetcher);
                    let resolver = self.resolver.clone();
                    let semaphore = Arc::clone(&semaphore);
                    tasks.push(tokio::spawn(async move {
                        let _permit = semaphore.acquire().await;
                        let content = fetch_file_content(&*fetcher, &resolver, &entry, &source).await?;
                        Ok::<_, RegistryError>((
                            index,
                            FileEntry {
                                content: Some(content),
                                ..entry
                            },
                        ))
                    }));
                }
            }
        }

        for joined in join_all(tasks).await {
            let (index, entry) = joined.map_err(|e| RegistryError::Hydration {
                path: "<task>".to_string(),
                reason: format!("hydration task failed: {e}"),
            })??;
            slots[index] = Some(entry);
        }

        // Every slot is filled: embedded entries at partition time,
        // reference entries above (any failure has already returned).
        let files = slots.into_iter().flatten().collect();

        Ok(Manifest {
            kind,
            name,
            files,
            meta,
        })
    }
}

/// Fetch one file's content from its source document, resolving any
/// placeholders the stored content itself carries.
async fn fetch_file_content(
    fetcher: &dyn DocumentFetcher,
    resolver: &ReferenceResolver,
    entry: &FileEntry,
    source: &Locator,
) -> Result<String, RegistryError> {
    debug!("hydrating {} from {}", entry.path, source);

    let document = fetcher
        .fetch(source)
        .await
        .map_err(|err| RegistryError::Hydration {
            path: entry.path.clone(),
            reason: err.to_string(),
        })?;

    let needs_resolution = match document.as_json() {
        Some(value) => has_references(value),
        None => true,
    };

    let content = document.substitution_text();
    if !needs_resolution {
        return Ok(content);
    }

    resolver
        .resolve_text_content(&content, source)
        .await
        .map_err(|err| match err {
            err @ (RegistryError::CyclicReference(_) | RegistryError::DepthExceeded(_)) => err,
            other => RegistryError::Hydration {
                path: entry.path.clone(),
                reason: other.to_string(),
            },
        })
}
