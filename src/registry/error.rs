//! Registry-specific error types

use serde::Serialize;
use thiserror::Error;

use crate::registry::manifest::ItemKind;

/// Field-level validation failure detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON path of the offending field (e.g. `files[2].path`)
    pub path: String,
    /// Human-readable reason
    pub reason: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Registry operation errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("request timed out after {0}s")]
    UpstreamTimeout(u64),

    #[error("manifest validation failed with {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: ItemKind,
        actual: ItemKind,
    },

    #[error("cyclic reference involving {0}")]
    CyclicReference(String),

    #[error("reference depth exceeded (max {0})")]
    DepthExceeded(usize),

    #[error("failed to resolve reference {locator}: {reason}")]
    Resolution { locator: String, reason: String },

    #[error("failed to hydrate {path}: {reason}")]
    Hydration { path: String, reason: String },
}

impl RegistryError {
    /// Whether a failed fetch may succeed on a later attempt.
    /// Only upstream availability problems qualify; `NotFound` is permanent
    /// on an append-only store and validation failures are caller errors.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RegistryError::UpstreamUnavailable(_) | RegistryError::UpstreamTimeout(_)
        )
    }
}
