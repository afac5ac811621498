//! Inline reference scanning and resolution
//!
//! Manifests may embed `{{vout:N}}` placeholders in any string field,
//! pointing at sibling outputs of their own transaction. Resolution
//! substitutes each placeholder with the sibling's content, recursively,
//! under an explicit traversal context: a memo map (repeated references
//! cost one fetch), an in-flight ancestor set (cycle detection), and a
//! depth budget. Malformed or adversarial documents fail fast instead of
//! looping.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::registry::error::RegistryError;
use crate::registry::fetch::DocumentFetcher;
use crate::registry::locator::Locator;

/// Inline placeholder pattern: `{{vout:N}}`
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{vout:(\d+)\}\}").expect("placeholder pattern"));

/// Depth bound for the boolean reference scan
const MAX_SCAN_DEPTH: usize = 32;

/// Check whether any string leaf of `value` contains a placeholder.
///
/// Short-circuits on the first match; used as a fast-path gate so
/// placeholder-free manifests skip resolution entirely.
pub fn has_references(value: &Value) -> bool {
    scan(value, MAX_SCAN_DEPTH)
}

fn scan(value: &Value, depth: usize) -> bool {
    if depth == 0 {
        return false;
    }
    match value {
        Value::String(s) => PLACEHOLDER.is_match(s),
        Value::Array(items) => items.iter().any(|v| scan(v, depth - 1)),
        Value::Object(map) => map.values().any(|v| scan(v, depth - 1)),
        _ => false,
    }
}

/// Per-call traversal state, shared across the whole resolution
#[derive(Default)]
struct ResolutionContext {
    /// Fully resolved sibling text, keyed by locator
    memo: HashMap<Locator, String>,
    /// Locators currently being expanded; re-entering one is a cycle
    in_flight: HashSet<Locator>,
}

/// Substitutes inline references with sibling content
#[derive(Clone)]
pub struct ReferenceResolver {
    fetcher: Arc<dyn DocumentFetcher>,
    max_depth: usize,
}

impl ReferenceResolver {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, max_depth: usize) -> Self {
        Self { fetcher, max_depth }
    }

    /// Resolve every placeholder in `document`, which was stored at
    /// `current`. Returns the substituted document; any unresolvable
    /// placeholder fails the whole call, never a partial substitution.
    pub async fn resolve(
        &self,
        document: &Value,
        current: &Locator,
    ) -> Result<Value, RegistryError> {
        let mut ctx = ResolutionContext::default();
        ctx.in_flight.insert(current.clone());
        self.resolve_node(document, current, &mut ctx, self.max_depth)
            .await
    }

    /// Resolve placeholders inside a bare text payload stored at `current`
    pub async fn resolve_text_content(
        &self,
        text: &str,
        current: &Locator,
    ) -> Result<String, RegistryError> {
        let mut ctx = ResolutionContext::default();
        ctx.in_flight.insert(current.clone());
        self.resolve_text(text, current, &mut ctx, self.max_depth)
            .await
    }

    fn resolve_node<'a>(
        &'a self,
        value: &'a Value,
        current: &'a Locator,
        ctx: &'a mut ResolutionContext,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Value, RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            match value {
                Value::String(s) => {
                    let resolved = self.resolve_text(s, current, ctx, depth).await?;
                    Ok(Value::String(resolved))
                }
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.resolve_node(item, current, &mut *ctx, depth).await?);
                    }
                    Ok(Value::Array(out))
                }
                Value::Object(map) => {
                    let mut out = serde_json::Map::with_capacity(map.len());
                    for (key, item) in map {
                        out.insert(
                            key.clone(),
                            self.resolve_node(item, current, &mut *ctx, depth).await?,
                        );
                    }
                    Ok(Value::Object(out))
                }
                other => Ok(other.clone()),
            }
        })
    }

    async fn resolve_text(
        &self,
        text: &str,
        current: &Locator,
        ctx: &mut ResolutionContext,
        depth: usize,
    ) -> Result<String, RegistryError> {
        // Collect match spans first; substitution below awaits per match.
        let matches: Vec<(usize, usize, u32)> = PLACEHOLDER
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let vout: u32 = caps.get(1)?.as_str().parse().ok()?;
                Some((whole.start(), whole.end(), vout))
            })
            .collect();

        if matches.is_empty() {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end, vout) in matches {
            let sibling = current.sibling(vout);
            let replacement = self.sibling_text(&sibling, &mut *ctx, depth).await?;
            out.push_str(&text[cursor..start]);
            out.push_str(&replacement);
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }

    /// Fetch and fully resolve one sibling, memoizing the result
    fn sibling_text<'a>(
        &'a self,
        locator: &'a Locator,
        ctx: &'a mut ResolutionContext,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<String, RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(resolved) = ctx.memo.get(locator) {
                return Ok(resolved.clone());
            }
            if ctx.in_flight.contains(locator) {
                return Err(RegistryError::CyclicReference(locator.to_string()));
            }
            if depth == 0 {
                return Err(RegistryError::DepthExceeded(self.max_depth));
            }

            debug!("resolving sibling reference {}", locator);
            let document =
                self.fetcher
                    .fetch(locator)
                    .await
                    .map_err(|err| RegistryError::Resolution {
                        locator: locator.to_string(),
                        reason: err.to_string(),
                    })?;

            ctx.in_flight.insert(locator.clone());
            let result = match document.as_json() {
                Some(value) => {
                    let resolved = self
                        .resolve_node(value, locator, &mut *ctx, depth - 1)
                        .await?;
                    match resolved {
                        Value::String(s) => s,
                        other => other.to_string(),
                    }
                }
                None => {
                    self.resolve_text(
                        &document.substitution_text(),
                        locator,
                        &mut *ctx,
                        depth - 1,
                    )
                    .await?
                }
            };
            ctx.in_flight.remove(locator);
            ctx.memo.insert(locator.clone(), result.clone());
            Ok(result)
        })
    }
}
