//! zanj - Reader for ZANJ containers and NumPy array payloads
//!
//! Decodes binary npy/npz array payloads and ZANJ document containers: a
//! JSON tree whose leaves may be inline-encoded arrays or references to
//! externally stored arrays and record streams, resolved lazily with
//! at-most-one fetch per distinct reference.
//!
//! # Features
//!
//! - Bit-exact npy decoding (header dictionary, little-endian element data,
//!   float16 widening to float32)
//! - Shaped arrays with numpy-style indexing: negative indices, wildcard
//!   and partial index vectors, broadcast assignment
//! - Inline array formats embedded in JSON (nested lists, hex, base64,
//!   zero-rank scalars)
//! - npz archives via an injected decompressor
//! - Lazy ZANJ loading over an injected transport, with a per-loader
//!   resolution cache shared across duplicate references
//!
//! # Example
//!
//! ```rust
//! use zanj::{DirFetcher, ZanjLoader};
//!
//! # fn main() -> Result<(), zanj::LoadError> {
//! # let dir = std::env::temp_dir().join("zanj-doc-example");
//! # std::fs::create_dir_all(&dir).ok();
//! # std::fs::write(dir.join("__zanj__.json"), br#"{"config": {"lr": 0.1}}"#).ok();
//! let loader = ZanjLoader::new(DirFetcher::new(&dir));
//! let root = loader.read_root()?;
//! if let Some(lr) = root.get("config.lr") {
//!     assert_eq!(lr.as_f64(), Some(0.1));
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod inline;
pub mod loader;
pub mod parser;
pub mod types;

#[cfg(feature = "ndarray")]
pub mod ndarray_ext;

// Re-export common types at crate root
pub use archive::read_entries;
pub use error::{DecodeError, IndexError, LoadError};
pub use inline::InlineFormat;
pub use parser::{ParseOptions, parse};
pub use types::{ArrayHeader, DType, Data, Element, Fill, Index, NdArray, Sliced};
pub use loader::{
    DeferredValue, DirFetcher, Fetcher, LoadOptions, Node, RefFormat, Resolved, ResolutionKey,
    ZanjLoader,
};

#[cfg(feature = "ndarray")]
pub use ndarray_ext::{ArrayType, NdarrayError};
