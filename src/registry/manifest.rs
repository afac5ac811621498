//! Item manifest parsing and validation
//!
//! A manifest is the typed form of a stored registry document: an item
//! kind, a name, an ordered file list, and free-form metadata. Validation
//! reports every malformed field with its JSON path rather than stopping
//! at the first problem, so callers can return actionable diagnostics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::error::{FieldError, RegistryError};
use crate::registry::fetch::FetchedDocument;
use crate::registry::locator::Locator;

/// Closed set of registry item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Block,
    Component,
    UiPrimitive,
    Style,
    Hook,
    Lib,
    Theme,
}

impl ItemKind {
    /// All known kinds, for diagnostics
    pub const ALL: [ItemKind; 7] = [
        ItemKind::Block,
        ItemKind::Component,
        ItemKind::UiPrimitive,
        ItemKind::Style,
        ItemKind::Hook,
        ItemKind::Lib,
        ItemKind::Theme,
    ];

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Block => "block",
            ItemKind::Component => "component",
            ItemKind::UiPrimitive => "ui-primitive",
            ItemKind::Style => "style",
            ItemKind::Hook => "hook",
            ItemKind::Lib => "lib",
            ItemKind::Theme => "theme",
        }
    }

    /// Consumer-schema type tag for this kind
    pub fn consumer_type(&self) -> &'static str {
        match self {
            ItemKind::Block => "registry:block",
            ItemKind::Component => "registry:component",
            ItemKind::UiPrimitive => "registry:ui",
            ItemKind::Style => "registry:style",
            ItemKind::Hook => "registry:hook",
            ItemKind::Lib => "registry:lib",
            ItemKind::Theme => "registry:theme",
        }
    }

    /// Whether this kind must carry at least one file.
    /// Styles and themes are pure configuration and may be metadata-only.
    pub fn requires_files(&self) -> bool {
        !matches!(self, ItemKind::Style | ItemKind::Theme)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown item kind: {s}"))
    }
}

/// How a file entry carries its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    /// Content stored inline in the manifest
    Embedded,
    /// Content stored in a sibling document, fetched during hydration
    Reference,
}

/// One file of a registry item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "sourceLocator", skip_serializing_if = "Option::is_none")]
    pub source_locator: Option<Locator>,
}

impl FileEntry {
    pub fn content_mode(&self) -> ContentMode {
        if self.content.is_some() {
            ContentMode::Embedded
        } else {
            ContentMode::Reference
        }
    }
}

/// Validated registry item manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub kind: ItemKind,
    pub name: String,
    pub files: Vec<FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Manifest {
    /// Whether every file entry carries literal content
    pub fn is_hydrated(&self) -> bool {
        self.files.iter().all(|f| f.content.is_some())
    }
}

/// Validate a fetched document as an item manifest.
///
/// All structural problems are collected into field-level errors; the
/// expected-kind check runs only once the structure is otherwise sound,
/// so a `KindMismatch` always reports two valid kinds.
pub fn validate(
    document: &FetchedDocument,
    expected_kind: Option<ItemKind>,
) -> Result<Manifest, RegistryError> {
    let value = document.as_json().ok_or_else(|| {
        RegistryError::Validation(vec![FieldError::new(
            "$",
            "document is not JSON".to_string(),
        )])
    })?;
    validate_value(value, expected_kind)
}

/// Validate a raw JSON value as an item manifest
pub fn validate_value(
    value: &Value,
    expected_kind: Option<ItemKind>,
) -> Result<Manifest, RegistryError> {
    let mut errors = Vec::new();

    let object = match value.as_object() {
        Some(object) => object,
        None => {
            return Err(RegistryError::Validation(vec![FieldError::new(
                "$",
                "manifest must be a JSON object",
            )]));
        }
    };

    let name = match object.get("name") {
        Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
        Some(Value::String(_)) => {
            errors.push(FieldError::new("name", "must not be empty"));
            None
        }
        Some(_) => {
            errors.push(FieldError::new("name", "must be a string"));
            None
        }
        None => {
            errors.push(FieldError::new("name", "required field is missing"));
            None
        }
    };

    let kind = match object.get("kind") {
        Some(Value::String(kind_str)) => match ItemKind::from_str(kind_str) {
            Ok(kind) => Some(kind),
            Err(_) => {
                errors.push(FieldError::new(
                    "kind",
                    format!(
                        "unknown kind {:?}; known kinds: {}",
                        kind_str,
                        ItemKind::ALL.map(|k| k.as_str()).join(", ")
                    ),
                ));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::new("kind", "must be a string"));
            None
        }
        None => {
            errors.push(FieldError::new("kind", "required field is missing"));
            None
        }
    };

    let files = match object.get("files") {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| validate_file_entry(index, entry, &mut errors))
            .collect(),
        Some(_) => {
            errors.push(FieldError::new("files", "must be an array"));
            Vec::new()
        }
        None => Vec::new(),
    };

    if let Some(kind) = kind {
        if kind.requires_files() && files.is_empty() && !errors.iter().any(|e| e.path.starts_with("files")) {
            errors.push(FieldError::new(
                "files",
                format!("kind {kind} requires at least one file"),
            ));
        }
    }

    let meta = match object.get("meta") {
        Some(meta @ Value::Object(_)) => Some(meta.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            errors.push(FieldError::new("meta", "must be an object"));
            None
        }
    };

    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    // Both are present whenever `errors` is empty
    let (name, kind) = match (name, kind) {
        (Some(name), Some(kind)) => (name, kind),
        _ => {
            return Err(RegistryError::Validation(vec![FieldError::new(
                "$",
                "manifest is missing required fields",
            )]));
        }
    };

    if let Some(expected) = expected_kind {
        if kind != expected {
            return Err(RegistryError::KindMismatch {
                expected,
                actual: kind,
            });
        }
    }

    Ok(Manifest {
        kind,
        name,
        files,
        meta,
    })
}

fn validate_file_entry(
    index: usize,
    entry: &Value,
    errors: &mut Vec<FieldError>,
) -> Option<FileEntry> {
    let field = |suffix: &str| format!("files[{index}]{suffix}");

    let object = match entry.as_object() {
        Some(object) => object,
        None => {
            errors.push(FieldError::new(field(""), "must be an object"));
            return None;
        }
    };

    let path = match object.get("path") {
        Some(Value::String(path)) if !path.is_empty() => Some(path.clone()),
        Some(Value::String(_)) => {
            errors.push(FieldError::new(field(".path"), "must not be empty"));
            None
        }
        Some(_) => {
            errors.push(FieldError::new(field(".path"), "must be a string"));
            None
        }
        None => {
            errors.push(FieldError::new(field(".path"), "required field is missing"));
            None
        }
    };

    let content = match object.get("content") {
        Some(Value::String(content)) => Some(content.clone()),
        Some(_) => {
            errors.push(FieldError::new(field(".content"), "must be a string"));
            None
        }
        None => None,
    };

    let source_locator = match object.get("sourceLocator") {
        Some(Value::String(raw)) => match Locator::parse(raw) {
            Ok(locator) => Some(locator),
            Err(err) => {
                errors.push(FieldError::new(field(".sourceLocator"), err.to_string()));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::new(
                field(".sourceLocator"),
                "must be a string",
            ));
            None
        }
        None => None,
    };

    match (
        object.contains_key("content"),
        object.contains_key("sourceLocator"),
    ) {
        (true, true) => {
            errors.push(FieldError::new(
                field(""),
                "content and sourceLocator are mutually exclusive",
            ));
            return None;
        }
        (false, false) => {
            errors.push(FieldError::new(
                field(""),
                "exactly one of content or sourceLocator is required",
            ));
            return None;
        }
        _ => {}
    }

    let path = path?;
    if content.is_none() && source_locator.is_none() {
        // The populated side failed its own check; already reported.
        return None;
    }

    Some(FileEntry {
        path,
        content,
        source_locator,
    })
}
