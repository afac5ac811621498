//! Registry item resolution
//!
//! Turns an opaque document locator into a self-contained, schema-valid
//! registry item: fetch the stored manifest, validate it, substitute
//! inline sibling references, hydrate externally-stored file contents,
//! and adapt the result to the installer-client schema.

pub mod adapter;
pub mod cache;
pub mod error;
pub mod fetch;
pub mod hydrator;
pub mod locator;
pub mod manifest;
pub mod resolver;
pub mod service;

pub use adapter::{adapt, AdaptedFile, AdaptedItem, ITEM_SCHEMA_URL};
pub use cache::{CacheStats, DocumentCache};
pub use error::{FieldError, RegistryError};
pub use fetch::{DocumentFetcher, FetchedDocument, HttpDocumentFetcher};
pub use hydrator::ManifestHydrator;
pub use locator::Locator;
pub use manifest::{ContentMode, FileEntry, ItemKind, Manifest};
pub use resolver::{has_references, ReferenceResolver};
pub use service::RegistryService;
