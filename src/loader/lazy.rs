//! Deferred reference handles and their resolution state
//!
//! Each reference key moves through `unresolved → resolving → resolved`
//! exactly once and never reverts; the completed result (success or
//! failure) lives in a [`OnceLock`] shared through the loader's cache.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use super::LoaderInner;
use crate::error::LoadError;
use crate::types::NdArray;

/// Storage format of a referenced payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefFormat {
    /// Binary array payload
    Npy,
    /// JSON document
    Json,
    /// Line-delimited JSON records
    Jsonl,
}

impl RefFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            RefFormat::Npy => "npy",
            RefFormat::Json => "json",
            RefFormat::Jsonl => "jsonl",
        }
    }

    /// Parse an explicit `format` field value
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "npy" => Some(RefFormat::Npy),
            "json" => Some(RefFormat::Json),
            "jsonl" => Some(RefFormat::Jsonl),
            _ => None,
        }
    }

    /// Infer from a reference path's suffix
    pub fn infer_from_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".npy") {
            Some(RefFormat::Npy)
        } else if lower.ends_with(".jsonl") {
            Some(RefFormat::Jsonl)
        } else if lower.ends_with(".json") {
            Some(RefFormat::Json)
        } else {
            None
        }
    }
}

impl fmt::Display for RefFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one unique deferred load: format plus target path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub format: RefFormat,
    pub path: String,
}

impl ResolutionKey {
    pub fn new(format: RefFormat, path: impl Into<String>) -> Self {
        ResolutionKey {
            format,
            path: path.into(),
        }
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.format, self.path)
    }
}

/// Resolved referenced content
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Decoded binary array
    Array(NdArray),
    /// Parsed JSON document
    Json(serde_json::Value),
    /// Ordered jsonl records
    Records(Vec<serde_json::Value>),
}

impl Resolved {
    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Resolved::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Resolved::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[serde_json::Value]> {
        match self {
            Resolved::Records(r) => Some(r),
            _ => None,
        }
    }
}

/// Cache slot for one resolution key.
///
/// The guard serializes the fetch; the cell holds the completed result.
/// Creating the slot under the cache map's lock is the atomic
/// "begin resolving" registration.
pub(crate) struct Slot {
    pub(crate) guard: Mutex<()>,
    pub(crate) cell: OnceLock<Result<Arc<Resolved>, LoadError>>,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Slot {
            guard: Mutex::new(()),
            cell: OnceLock::new(),
        }
    }
}

/// Deferred-load handle occupying a reference's position in a materialized
/// tree.
///
/// Rust has no transparent property interception, so consumers request the
/// value explicitly: [`resolve`](Self::resolve) triggers the fetch on first
/// access and returns the shared cached result on every later one.
#[derive(Clone)]
pub struct DeferredValue {
    pub(crate) key: ResolutionKey,
    pub(crate) loader: Arc<LoaderInner>,
}

impl DeferredValue {
    pub fn key(&self) -> &ResolutionKey {
        &self.key
    }

    /// Trigger (or await) resolution and return the shared result.
    ///
    /// At most one fetch runs per distinct key; a cached failure is
    /// replayed until the loader's cache entry is invalidated.
    pub fn resolve(&self) -> Result<Arc<Resolved>, LoadError> {
        self.loader.resolve(&self.key)
    }

    /// Peek at the cached result without triggering a fetch
    pub fn peek(&self) -> Option<Result<Arc<Resolved>, LoadError>> {
        self.loader.peek(&self.key)
    }
}

impl fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredValue")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DeferredValue {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
