//! registry-node - Registry item resolution gateway
//!
//! Serves component registry items that are inscribed as immutable
//! documents on a content-addressed, append-only ledger. A locator
//! (`txid:vout`) names one document; the node fetches it, validates it as
//! an item manifest, substitutes inline sibling references, hydrates
//! externally-stored file contents, and serves the result adapted to the
//! installer-client schema.
//!
//! ## Pipeline
//!
//! locator → fetch → validate → (reference scan) → resolve → hydrate →
//! adapt → serve. Every stage returns a typed error and short-circuits
//! the request; no stage ever commits a partial result.
//!
//! ## Design principles
//!
//! 1. **Immutability first**: stored documents never change, so every
//!    fetch is referentially transparent and cacheable forever.
//! 2. **Bounded traversal**: reference resolution carries an explicit
//!    visited set and depth budget; adversarial documents fail, never loop.
//! 3. **All-or-nothing hydration**: an item with missing files is not a
//!    partial success, it is a failure.

pub mod config;
pub mod registry;
pub mod rpc;

pub use config::NodeConfig;
pub use registry::{
    AdaptedItem, DocumentFetcher, FetchedDocument, ItemKind, Locator, Manifest, RegistryError,
    RegistryService,
};
