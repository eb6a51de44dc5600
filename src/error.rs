//! Error types for zanj

use thiserror::Error;

/// Errors from decoding array payloads (npy headers, element buffers,
/// inline JSON encodings).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Invalid magic bytes
    #[error("invalid magic bytes, not an npy payload")]
    InvalidMagic,
    /// Unsupported npy format version
    #[error("unsupported npy version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    /// Header dictionary could not be normalized into structured data
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// Dtype descriptor has no registry entry
    #[error("unsupported dtype: {0}")]
    UnsupportedDtype(String),
    /// Only little-endian element data is supported
    #[error("unsupported byte order in dtype: {0}")]
    UnsupportedByteOrder(String),
    /// Buffer ends before the declared element data does
    #[error("truncated buffer: need {needed} bytes, have {available}")]
    TruncatedBuffer { needed: usize, available: usize },
    /// Element count disagrees with the declared shape
    #[error("data size mismatch: expected {expected} elements, got {actual}")]
    DataSizeMismatch { expected: usize, actual: usize },
    /// Inline metadata names a format outside the known set
    #[error("unknown array format: {0}")]
    UnknownArrayFormat(String),
    /// Hex or base64 payload that does not decode to bytes
    #[error("invalid {encoding} payload: {reason}")]
    InvalidEncoding {
        encoding: &'static str,
        reason: String,
    },
    /// Non-list inline format without shape or dtype
    #[error("inline array missing field: {0}")]
    MissingShapeOrDtype(&'static str),
}

/// Errors from indexed access into an [`NdArray`](crate::NdArray).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Index out of range after negative-index normalization
    #[error("index {index} is out of bounds for axis {axis} with size {extent}")]
    IndexOutOfBounds {
        index: i64,
        axis: usize,
        extent: usize,
    },
    /// More non-wildcard indices than the array has axes
    #[error("too many indices: got {given} for array of rank {rank}")]
    TooManyIndices { given: usize, rank: usize },
    /// Value sequence length disagrees with the selected position count
    #[error("cannot broadcast {actual} values to {expected} positions")]
    BroadcastMismatch { expected: usize, actual: usize },
}

/// Errors from loading ZANJ documents and resolving references.
///
/// Clonable so a failed resolution can be cached and replayed to every
/// later access of the same reference key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Reference format neither declared nor inferable from the path suffix
    #[error("unknown reference format for path: {0}")]
    UnknownReferenceFormat(String),
    /// Fetch or parse failed while resolving a reference
    #[error("failed to resolve {key}: {reason}")]
    ResolutionFailed { key: String, reason: String },
    /// Document is not valid JSON or has an unexpected structure
    #[error("malformed document: {0}")]
    Malformed(String),
    /// Inline array decode failed during materialization
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
