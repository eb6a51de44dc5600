//! ZANJ container loading
//!
//! A ZANJ container is a root JSON document (`__zanj__.json`) whose leaves
//! may be references to externally stored payloads. Loading materializes the
//! document into a [`Node`] tree: inline-tagged arrays decode eagerly,
//! references become [`DeferredValue`] handles, and everything else is
//! copied with field order preserved. Each distinct reference is fetched at
//! most once, no matter how many handles point at it or how many threads
//! race on the first access.

mod fetch;
mod lazy;

pub use fetch::{DirFetcher, Fetcher};
pub use lazy::{DeferredValue, RefFormat, Resolved, ResolutionKey};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::error::LoadError;
use crate::inline;
use crate::parser::ParseOptions;
use crate::types::NdArray;
use lazy::Slot;

/// Reserved key marking a reference object
pub const REF_KEY: &str = "$ref";

/// Container-relative path of the root document
pub const ROOT_FILE: &str = "__zanj__.json";

/// Loader options
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Widen float16 arrays to float32 (on by default)
    pub convert_f16: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { convert_f16: true }
    }
}

/// One value of a materialized ZANJ document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// Inline array, decoded during materialization
    Array(NdArray),
    /// Reference awaiting resolution
    Deferred(DeferredValue),
    List(Vec<Node>),
    /// Fields in document order
    Object(Vec<(String, Node)>),
}

impl Node {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&DeferredValue> {
        match self {
            Node::Deferred(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Node)]> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get a nested node by dot-separated path (e.g. `"nested.value"`)
    pub fn get(&self, path: &str) -> Option<&Node> {
        let mut current = self;
        for key in path.split('.') {
            match current {
                Node::Object(entries) => {
                    current = entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }
}

/// Loads ZANJ documents and resolves their references.
///
/// The resolution cache is scoped to one loader instance; it starts empty
/// and holds only completed or in-flight results, so there is nothing to
/// tear down.
pub struct ZanjLoader {
    inner: Arc<LoaderInner>,
}

pub(crate) struct LoaderInner {
    fetcher: Box<dyn Fetcher>,
    opts: LoadOptions,
    cache: Mutex<HashMap<ResolutionKey, Arc<Slot>>>,
}

impl ZanjLoader {
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self::with_options(fetcher, LoadOptions::default())
    }

    pub fn with_options(fetcher: impl Fetcher + 'static, opts: LoadOptions) -> Self {
        ZanjLoader {
            inner: Arc::new(LoaderInner {
                fetcher: Box::new(fetcher),
                opts,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Fetch and materialize the root document
    pub fn read_root(&self) -> Result<Node, LoadError> {
        debug!(path = ROOT_FILE, "loading zanj root");
        let bytes = self
            .inner
            .fetcher
            .fetch(ROOT_FILE)
            .map_err(|e| LoadError::ResolutionFailed {
                key: format!("json:{ROOT_FILE}"),
                reason: e.to_string(),
            })?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::Malformed(e.to_string()))?;
        self.materialize(&value)
    }

    /// Materialize an arbitrary JSON value into a [`Node`] tree.
    ///
    /// Reference objects become deferred handles bound to this loader's
    /// cache; inline-tagged arrays decode now; everything else is copied,
    /// recursing into lists and objects.
    pub fn materialize(&self, value: &serde_json::Value) -> Result<Node, LoadError> {
        self.inner.materialize(&self.inner, value)
    }

    /// Drop the cache entry for one key so the next access re-fetches.
    /// Returns whether an entry was present.
    pub fn invalidate(&self, key: &ResolutionKey) -> bool {
        self.inner.lock_cache().remove(key).is_some()
    }

    /// Drop every cached resolution
    pub fn clear_cache(&self) {
        self.inner.lock_cache().clear();
    }
}

impl LoaderInner {
    fn lock_cache(&self) -> MutexGuard<'_, HashMap<ResolutionKey, Arc<Slot>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn materialize(
        &self,
        self_arc: &Arc<LoaderInner>,
        value: &serde_json::Value,
    ) -> Result<Node, LoadError> {
        match value {
            serde_json::Value::Null => Ok(Node::Null),
            serde_json::Value::Bool(b) => Ok(Node::Bool(*b)),
            serde_json::Value::Number(n) => Ok(Node::Number(n.clone())),
            serde_json::Value::String(s) => Ok(Node::String(s.clone())),
            serde_json::Value::Array(items) => {
                let nodes = items
                    .iter()
                    .map(|item| self.materialize(self_arc, item))
                    .collect::<Result<Vec<Node>, LoadError>>()?;
                Ok(Node::List(nodes))
            }
            serde_json::Value::Object(map) => {
                if let Some(target) = map.get(REF_KEY) {
                    let path = target
                        .as_str()
                        .ok_or_else(|| LoadError::Malformed("non-string $ref".to_string()))?;
                    let format = match map.get("format").and_then(|f| f.as_str()) {
                        Some(name) => RefFormat::from_name(name)
                            .ok_or_else(|| LoadError::UnknownReferenceFormat(name.to_string()))?,
                        None => RefFormat::infer_from_path(path)
                            .ok_or_else(|| LoadError::UnknownReferenceFormat(path.to_string()))?,
                    };
                    let key = ResolutionKey::new(format, path);
                    trace!(key = %key, "deferring reference");
                    return Ok(Node::Deferred(DeferredValue {
                        key,
                        loader: self_arc.clone(),
                    }));
                }
                let parse_opts = self.parse_options();
                if let Some(array) = inline::decode_with(value, &parse_opts)? {
                    return Ok(Node::Array(array));
                }
                let fields = map
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.materialize(self_arc, v)?)))
                    .collect::<Result<Vec<(String, Node)>, LoadError>>()?;
                Ok(Node::Object(fields))
            }
        }
    }

    pub(crate) fn resolve(&self, key: &ResolutionKey) -> Result<Arc<Resolved>, LoadError> {
        // Slot creation under the map lock is the atomic begin-resolving
        // registration; concurrent first accesses land on the same slot.
        let slot = self
            .lock_cache()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Slot::new()))
            .clone();

        if let Some(result) = slot.cell.get() {
            trace!(key = %key, "resolution cache hit");
            return result.clone();
        }

        let _guard = slot.guard.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(result) = slot.cell.get() {
            return result.clone();
        }

        debug!(key = %key, "resolving reference");
        let result = self.fetch_and_decode(key).map(Arc::new);
        if let Err(err) = &result {
            debug!(key = %key, error = %err, "resolution failed; caching failure");
        }
        let _ = slot.cell.set(result.clone());
        result
    }

    pub(crate) fn peek(&self, key: &ResolutionKey) -> Option<Result<Arc<Resolved>, LoadError>> {
        let slot = self.lock_cache().get(key).cloned()?;
        slot.cell.get().cloned()
    }

    fn fetch_and_decode(&self, key: &ResolutionKey) -> Result<Resolved, LoadError> {
        let failed = |reason: String| LoadError::ResolutionFailed {
            key: key.to_string(),
            reason,
        };
        let bytes = self
            .fetcher
            .fetch(&key.path)
            .map_err(|e| failed(e.to_string()))?;
        match key.format {
            RefFormat::Npy => crate::parser::parse_with(&bytes, &self.parse_options())
                .map(Resolved::Array)
                .map_err(|e| failed(e.to_string())),
            RefFormat::Json => serde_json::from_slice(&bytes)
                .map(Resolved::Json)
                .map_err(|e| failed(e.to_string())),
            RefFormat::Jsonl => {
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| failed(e.to_string()))?;
                text.lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| serde_json::from_str(line).map_err(|e| failed(e.to_string())))
                    .collect::<Result<Vec<serde_json::Value>, LoadError>>()
                    .map(Resolved::Records)
            }
        }
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            convert_f16: self.opts.convert_f16,
        }
    }
}
