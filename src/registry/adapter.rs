//! Consumer-schema adaptation
//!
//! The installer client consumes registry items in its own schema, not
//! the internal manifest shape. Adaptation is a total, side-effect-free
//! projection: field renames, a schema stamp, and removal of resolution
//! bookkeeping. It never fails; a hydrated manifest always adapts.

use serde::Serialize;
use serde_json::Value;

use crate::registry::manifest::Manifest;

/// Schema the adapted item conforms to
pub const ITEM_SCHEMA_URL: &str = "https://ui.shadcn.com/schema/registry-item.json";

/// One file of an adapted item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptedFile {
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub content: String,
}

/// Registry item in the installer-client schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptedItem {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub files: Vec<AdaptedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Project a hydrated manifest into the consumer schema.
///
/// `sourceLocator` fields are dropped; file entries inherit the item's
/// type tag. Entries without content cannot occur after hydration, but
/// the projection stays total by emitting an empty string rather than
/// failing.
pub fn adapt(manifest: Manifest) -> AdaptedItem {
    let item_type = manifest.kind.consumer_type().to_string();
    let files = manifest
        .files
        .into_iter()
        .map(|entry| AdaptedFile {
            path: entry.path,
            file_type: item_type.clone(),
            content: entry.content.unwrap_or_default(),
        })
        .collect();

    AdaptedItem {
        schema: ITEM_SCHEMA_URL.to_string(),
        name: manifest.name,
        item_type,
        files,
        meta: manifest.meta,
    }
}
